//! Resolver error types

use fundwatch_domain::EntityId;
use thiserror::Error;

/// Errors that can occur during entity resolution
///
/// An ambiguous name is not an error; it is reported as
/// [`Resolution::Ambiguous`](crate::Resolution::Ambiguous).
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Store error during lookup or creation
    #[error("Store error: {0}")]
    Store(String),

    /// Name normalizes to nothing
    #[error("Name '{0}' has no matchable characters")]
    EmptyName(String),

    /// Entity referenced by a merge pointer does not exist
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    /// Merge pointers loop or run too deep
    #[error("Merge chain from {0} does not terminate")]
    MergeCycle(EntityId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

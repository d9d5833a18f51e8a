//! Reconciliation error types

use fundwatch_domain::{EntityId, FieldKey};
use thiserror::Error;

/// Errors that can occur while detecting conflicts or committing facts
///
/// Conflicts and low-confidence claims are outcomes, reported through
/// [`Decision`](crate::Decision), not errors.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The stored revision moved since the caller read it
    #[error("Stale commit: expected revision {expected}, found {actual}")]
    StaleCommit {
        /// Revision the caller expected
        expected: u64,
        /// Revision actually stored
        actual: u64,
    },

    /// Referenced entity does not exist
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A value of the wrong kind for its field
    #[error("Value of type {found} cannot be committed to {key}")]
    ValueKind {
        /// Field key
        key: FieldKey,
        /// Type of the offered value
        found: &'static str,
    },

    /// Storage layer error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

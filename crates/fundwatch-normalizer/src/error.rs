//! Error types for the Normalizer

use thiserror::Error;

/// Errors that can occur during normalization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// Record lacks the entity name or carries no factual field
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}


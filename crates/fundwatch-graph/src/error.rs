//! Graph error types

use thiserror::Error;

/// Errors that can occur while building or exporting a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// The build was cancelled between rounds; nothing was produced
    #[error("Graph build cancelled after {rounds_done} of {rounds_total} rounds")]
    Cancelled {
        /// Rounds processed before the flag was seen
        rounds_done: usize,
        /// Rounds in the input
        rounds_total: usize,
    },

    /// JSON export failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

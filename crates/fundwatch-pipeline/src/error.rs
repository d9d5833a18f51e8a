//! Pipeline error types

use fundwatch_graph::GraphError;
use fundwatch_normalizer::NormalizeError;
use fundwatch_queue::QueueError;
use fundwatch_reconciler::ReconcileError;
use fundwatch_resolver::ResolverError;
use thiserror::Error;

/// Errors that can occur while running the pipeline
///
/// A malformed record is not an error here; it is counted in the report and
/// skipped.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Normalization failed
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Entity resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolverError),

    /// Reconciliation failed
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A queue operation failed
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Graph build failed or was cancelled
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Storage layer error
    #[error("Store error: {0}")]
    Store(String),

    /// A lock was poisoned
    #[error("Lock error: {0}")]
    Lock(String),

    /// A blocking task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Join(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Join(e.to_string())
    }
}

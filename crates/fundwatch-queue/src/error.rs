//! Error types for queue operations

use fundwatch_domain::{TaskId, TaskStatus};
use fundwatch_reconciler::ReconcileError;
use thiserror::Error;

/// Errors that can occur while moving tasks through review
#[derive(Error, Debug)]
pub enum QueueError {
    /// The task is not in a state that allows the action
    #[error("Cannot {action} task {task}: it is {from}")]
    InvalidTransition {
        /// Task the action targeted
        task: TaskId,
        /// Status the task was in
        from: TaskStatus,
        /// Attempted action
        action: &'static str,
    },

    /// Task does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Verification needs a value the request did not carry
    #[error("A chosen value is required: {0}")]
    MissingValue(String),

    /// The chosen value does not fit the task
    #[error("Invalid chosen value: {0}")]
    InvalidValue(String),

    /// Rejection without an explanation
    #[error("Rejecting a task requires notes")]
    NotesRequired,

    /// Committing the reviewed value failed
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (lock poisoning, runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

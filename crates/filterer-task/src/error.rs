//! Error types for filterer-task

use thiserror::Error;

/// Errors that can occur while managing background tasks
#[derive(Debug, Error)]
pub enum TaskError {
    /// The operating system refused to start a worker thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A worker thread panicked
    #[error("worker thread panicked: {0}")]
    Panicked(String),
}

/// Result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

//! Error types for queue operations.

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Dequeue was called with nothing queued.
    #[error("dequeue from empty queue")]
    Empty,
}

/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

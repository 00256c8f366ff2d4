//! Error types for the worker crate.

use dispatch_models::ActionKind;
use thiserror::Error;

/// Errors that can occur in the worker pool.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// Dispatcher not started.
    #[error("dispatcher not started")]
    NotStarted,

    /// Dispatcher already started.
    #[error("dispatcher already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors a message handler reports back to the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler does not process this kind of action.
    #[error("unsupported action: {0}")]
    Unsupported(ActionKind),

    /// The action was attempted and failed.
    #[error("action failed: {0}")]
    Failed(String),
}

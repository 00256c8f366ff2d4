//! Error types for CLI commands.

use dispatch_worker::WorkerError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An input line was not a valid action message.
    #[error("line {line}: invalid action: {source}")]
    Parse {
        /// 1-based input line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Writing JSON output failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool error.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The worker pool did not finish in time.
    #[error("timed out with {0} action(s) still unprocessed")]
    Timeout(usize),
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CliError>;

//! Worker pool draining the action queue for action dispatch.
//!
//! This crate provides the execution side of the queue:
//! - `Dispatcher` - spawns worker threads that block on a shared
//!   `ConcurrentPriorityQueue` and hand each message to a `MessageHandler`
//! - `DispatcherConfig` - worker count and idle check interval, with env overrides
//! - `MessageHandler` - the seam to whatever actually performs an action
//!
//! # Key Concepts
//!
//! ## Shutdown
//!
//! Workers wait with a cancellable dequeue. `Dispatcher::shutdown` cancels
//! the pool's token, which wakes every blocked worker; a worker that is
//! mid-message finishes it first. Queued messages are left in place.
//!
//! ## Failures
//!
//! Handler errors are logged and counted in `DispatchStats`. The worker
//! keeps going; retries are the handler's business.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;

pub use config::DispatcherConfig;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{HandlerError, Result, WorkerError};
pub use handler::MessageHandler;

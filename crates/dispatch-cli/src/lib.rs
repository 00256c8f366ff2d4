//! Command-line driver for action dispatch.
//!
//! - `simulate` queues a generated batch of workflow actions and drains it
//!   through a `Dispatcher` worker pool
//! - `order` shows the dispatch order of actions read as JSON lines

pub mod cli;
pub mod commands;
pub mod error;

pub use error::{CliError, Result};

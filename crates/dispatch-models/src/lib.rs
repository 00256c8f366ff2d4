//! Core data models for action dispatch.
//!
//! This crate provides the fundamental data types shared by the queue,
//! the worker pool and the CLI: priorities, ids and the action messages
//! produced when a workflow changes state.

pub mod action;
pub mod ids;
pub mod priority;

// Re-export main types
pub use action::{default_priority, ActionKind, ActionMessage};
pub use ids::{MessageId, TenantId};
pub use priority::{ParsePriorityError, Priority};

//! Blocking three-level priority queue for action dispatch.
//!
//! This crate provides, bottom-up:
//! - `CountingSemaphore` - `Mutex` + `Condvar` counter consumers block on
//! - `FifoBucket` - arrival-ordered items of one priority level
//! - `PriorityQueue` - High, Normal and Low buckets drained in strict order
//! - `ConcurrentPriorityQueue` - lock + semaphore wrapper with blocking,
//!   timed and cancellable dequeue
//! - `CancellationToken` - releases consumers blocked in a dequeue
//!
//! # Example
//!
//! ```
//! use dispatch_queue::{CancellationToken, ConcurrentPriorityQueue};
//! use dispatch_models::Priority;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(ConcurrentPriorityQueue::new());
//! let token = CancellationToken::new();
//!
//! let worker = {
//!     let q = queue.clone();
//!     let t = token.clone();
//!     thread::spawn(move || {
//!         let mut seen = Vec::new();
//!         while let Some(job) = q.dequeue_cancellable(&t) {
//!             seen.push(job);
//!             if seen.len() == 2 {
//!                 break;
//!             }
//!         }
//!         seen
//!     })
//! };
//!
//! queue.enqueue(Priority::Low, "cleanup");
//! queue.enqueue(Priority::High, "notify");
//!
//! let seen = worker.join().unwrap();
//! assert_eq!(seen.len(), 2);
//! token.cancel();
//! ```

pub mod bucket;
pub mod cancel;
pub mod concurrent;
pub mod error;
pub mod priority;
pub mod semaphore;

pub use bucket::FifoBucket;
pub use cancel::CancellationToken;
pub use concurrent::ConcurrentPriorityQueue;
pub use error::{QueueError, Result};
pub use priority::PriorityQueue;
pub use semaphore::CountingSemaphore;

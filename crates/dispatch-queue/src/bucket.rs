//! FifoBucket - arrival-ordered items of a single priority level.

use std::collections::VecDeque;

use crate::error::{QueueError, Result};

/// Items of one priority level, in arrival order.
#[derive(Debug)]
pub struct FifoBucket<T> {
    items: VecDeque<T>,
}

impl<T> FifoBucket<T> {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Appends an item at the tail.
    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Removes and returns the head item.
    ///
    /// Returns `QueueError::Empty` if the bucket holds nothing; callers are
    /// expected to check `count()` first.
    pub fn dequeue(&mut self) -> Result<T> {
        self.items.pop_front().ok_or(QueueError::Empty)
    }

    /// Returns the number of held items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the bucket holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for FifoBucket<T> {
    fn default() -> Self {
        Self::new()
    }
}

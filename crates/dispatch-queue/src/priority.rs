//! PriorityQueue - three FIFO buckets drained in strict priority order.

use dispatch_models::Priority;

use crate::bucket::FifoBucket;
use crate::error::{QueueError, Result};

/// Single-threaded priority queue with one FIFO bucket per level.
///
/// # Ordering Rules
///
/// 1. Any High item comes out before any Normal item, and any Normal item
///    before any Low item, regardless of arrival time.
/// 2. Within one level, first in is first out.
///
/// There is no aging: a steady stream of High items starves the lower
/// levels indefinitely.
///
/// Priority is passed beside the item, so `T` carries no trait bound.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    /// Buckets indexed by `slot()`, highest priority first.
    buckets: [FifoBucket<T>; 3],
    /// Sum of all bucket counts.
    count: usize,
}

/// Maps a priority to its bucket index in dequeue order.
fn slot(priority: Priority) -> usize {
    match priority {
        Priority::High => 0,
        Priority::Normal => 1,
        Priority::Low => 2,
    }
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            buckets: [FifoBucket::new(), FifoBucket::new(), FifoBucket::new()],
            count: 0,
        }
    }

    /// Appends an item to the tail of its priority's bucket.
    pub fn enqueue(&mut self, priority: Priority, item: T) {
        self.buckets[slot(priority)].enqueue(item);
        self.count += 1;
    }

    /// Removes and returns the oldest item of the highest non-empty level.
    ///
    /// Returns `QueueError::Empty` if all three buckets are empty.
    pub fn dequeue(&mut self) -> Result<T> {
        let bucket = self
            .buckets
            .iter_mut()
            .find(|b| !b.is_empty())
            .ok_or(QueueError::Empty)?;

        let item = bucket.dequeue()?;
        self.count -= 1;
        Ok(item)
    }

    /// Returns the total number of queued items.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the number of items queued at one level.
    pub fn count_at(&self, priority: Priority) -> usize {
        self.buckets[slot(priority)].count()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_count_invariant<T>(queue: &PriorityQueue<T>) {
        let sum: usize = Priority::ALL.iter().map(|p| queue.count_at(*p)).sum();
        assert_eq!(queue.count(), sum);
    }

    #[test]
    fn test_priority_ordering() {
        let mut queue = PriorityQueue::new();

        queue.enqueue(Priority::Normal, "X");
        queue.enqueue(Priority::High, "Y");
        queue.enqueue(Priority::Low, "Z");

        assert_eq!(queue.dequeue().unwrap(), "Y");
        assert_eq!(queue.dequeue().unwrap(), "X");
        assert_eq!(queue.dequeue().unwrap(), "Z");
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut queue = PriorityQueue::new();

        queue.enqueue(Priority::High, "A");
        queue.enqueue(Priority::High, "B");

        assert_eq!(queue.dequeue().unwrap(), "A");
        assert_eq!(queue.dequeue().unwrap(), "B");
    }

    #[test]
    fn test_mixed_sequence() {
        let mut queue = PriorityQueue::new();
        let input = [
            (Priority::Low, 1),
            (Priority::Normal, 2),
            (Priority::High, 3),
            (Priority::Low, 4),
            (Priority::High, 5),
            (Priority::Normal, 6),
            (Priority::Normal, 7),
            (Priority::High, 8),
        ];
        for (priority, n) in input {
            queue.enqueue(priority, n);
            assert_count_invariant(&queue);
        }

        let mut out = Vec::new();
        while let Ok(n) = queue.dequeue() {
            out.push(n);
            assert_count_invariant(&queue);
        }

        assert_eq!(out, vec![3, 5, 8, 2, 6, 7, 1, 4]);
    }

    #[test]
    fn test_high_preempts_earlier_low() {
        let mut queue = PriorityQueue::new();

        queue.enqueue(Priority::Low, "low");
        for _ in 0..5 {
            queue.enqueue(Priority::High, "high");
        }

        for _ in 0..5 {
            assert_eq!(queue.dequeue().unwrap(), "high");
        }
        assert_eq!(queue.dequeue().unwrap(), "low");
    }

    #[test]
    fn test_count() {
        let mut queue = PriorityQueue::new();
        for i in 0..5 {
            queue.enqueue(Priority::Normal, i);
        }
        assert_eq!(queue.count(), 5);
        assert_eq!(queue.count(), 5);

        queue.dequeue().unwrap();
        assert_eq!(queue.count(), 4);
        assert_eq!(queue.count_at(Priority::Normal), 4);
        assert_eq!(queue.count_at(Priority::High), 0);
    }

    #[test]
    fn test_dequeue_empty() {
        let mut queue: PriorityQueue<u8> = PriorityQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), Err(QueueError::Empty));
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_count_after_n_enqueues_m_dequeues() {
        let mut queue = PriorityQueue::new();
        for i in 0..12 {
            queue.enqueue(Priority::ALL[i % 3], i);
        }
        for _ in 0..7 {
            queue.dequeue().unwrap();
        }
        assert_eq!(queue.count(), 5);
        assert_count_invariant(&queue);
    }
}

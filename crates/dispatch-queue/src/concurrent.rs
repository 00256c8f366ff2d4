//! ConcurrentPriorityQueue - blocking, thread-safe priority queue.
//!
//! Concurrency pattern:
//! - `Mutex<PriorityQueue<T>>` guards all bucket mutation
//! - `CountingSemaphore` mirrors the queued count so `dequeue` can block
//!
//! Every `enqueue` inserts under the lock and only then calls `up()`, so a
//! consumer that got a unit from `down()` always finds an item waiting.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dispatch_models::Priority;
use tracing::trace;

use crate::cancel::CancellationToken;
use crate::priority::PriorityQueue;
use crate::semaphore::CountingSemaphore;

/// Thread-safe priority queue whose `dequeue` blocks while empty.
///
/// Share one instance per worker pool with `Arc`; producers call `enqueue`,
/// consumers call one of the dequeue variants.
///
/// # Example
///
/// ```
/// use dispatch_queue::ConcurrentPriorityQueue;
/// use dispatch_models::Priority;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(ConcurrentPriorityQueue::new());
///
/// let consumer = {
///     let q = queue.clone();
///     thread::spawn(move || q.dequeue())
/// };
///
/// queue.enqueue(Priority::High, "reindex");
/// assert_eq!(consumer.join().unwrap(), "reindex");
/// ```
pub struct ConcurrentPriorityQueue<T> {
    /// Inner queue; only touched while locked.
    inner: Mutex<PriorityQueue<T>>,
    /// One unit per queued item.
    available: CountingSemaphore,
}

impl<T> ConcurrentPriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PriorityQueue::new()),
            available: CountingSemaphore::new(0),
        }
    }

    /// Locks the inner queue.
    ///
    /// Inner operations never panic part-way through an update, so a
    /// poisoned lock still guards a consistent queue and is recovered.
    fn lock(&self) -> MutexGuard<'_, PriorityQueue<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an item at `priority` and wakes one waiting consumer.
    pub fn enqueue(&self, priority: Priority, item: T) {
        let depth = {
            let mut queue = self.lock();
            queue.enqueue(priority, item);
            queue.count()
        };

        // Signal only after the item is visible under the lock.
        self.available.up();

        trace!(priority = %priority, depth, "enqueued");
    }

    /// Removes and returns the next item, blocking while the queue is empty.
    ///
    /// Blocks forever if nothing is ever enqueued. Use
    /// `dequeue_cancellable` or `dequeue_timeout` where shutdown matters.
    pub fn dequeue(&self) -> T {
        self.available.down();
        self.take_reserved()
    }

    /// Removes and returns the next item if one is queued, without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        if self.available.try_down() {
            Some(self.take_reserved())
        } else {
            None
        }
    }

    /// Waits at most `timeout` for an item.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        if self.available.down_timeout(timeout) {
            Some(self.take_reserved())
        } else {
            None
        }
    }

    /// Waits for an item until `token` is cancelled.
    ///
    /// Returns `None` once the token is cancelled, leaving any queued items
    /// in place.
    pub fn dequeue_cancellable(&self, token: &CancellationToken) -> Option<T> {
        if self.available.down_cancellable(token) {
            Some(self.take_reserved())
        } else {
            None
        }
    }

    /// Pops an item after a semaphore unit has been taken.
    fn take_reserved(&self) -> T {
        let mut queue = self.lock();
        match queue.dequeue() {
            Ok(item) => {
                trace!(depth = queue.count(), "dequeued");
                item
            }
            // Every unit comes from an enqueue that already inserted.
            Err(e) => panic!("semaphore unit without a queued item: {}", e),
        }
    }

    /// Returns the number of queued items. Advisory snapshot.
    pub fn count(&self) -> usize {
        self.lock().count()
    }

    /// Returns the number of items queued at one level. Advisory snapshot.
    pub fn count_at(&self, priority: Priority) -> usize {
        self.lock().count_at(priority)
    }

    /// Returns true if nothing is queued. Advisory snapshot.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for ConcurrentPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConcurrentPriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.lock();
        f.debug_struct("ConcurrentPriorityQueue")
            .field("high", &queue.count_at(Priority::High))
            .field("normal", &queue.count_at(Priority::Normal))
            .field("low", &queue.count_at(Priority::Low))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_priority_ordering() {
        let queue = ConcurrentPriorityQueue::new();

        queue.enqueue(Priority::Normal, "X");
        queue.enqueue(Priority::High, "Y");
        queue.enqueue(Priority::Low, "Z");

        assert_eq!(queue.dequeue(), "Y");
        assert_eq!(queue.dequeue(), "X");
        assert_eq!(queue.dequeue(), "Z");
    }

    #[test]
    fn test_fifo_within_priority() {
        let queue = ConcurrentPriorityQueue::new();

        queue.enqueue(Priority::High, "A");
        queue.enqueue(Priority::High, "B");

        assert_eq!(queue.dequeue(), "A");
        assert_eq!(queue.dequeue(), "B");
    }

    #[test]
    fn test_count() {
        let queue = ConcurrentPriorityQueue::new();
        for i in 0..5 {
            queue.enqueue(Priority::Normal, i);
        }
        assert_eq!(queue.count(), 5);

        queue.dequeue();
        assert_eq!(queue.count(), 4);
        assert_eq!(queue.count(), 4);
        assert_eq!(queue.count_at(Priority::Normal), 4);
    }

    #[test]
    fn test_empty_dequeue_blocks() {
        let queue: Arc<ConcurrentPriorityQueue<u32>> = Arc::new(ConcurrentPriorityQueue::new());
        assert_eq!(queue.count(), 0);

        let (tx, rx) = mpsc::channel();
        let q = queue.clone();
        thread::spawn(move || {
            let item = q.dequeue();
            let _ = tx.send(item);
        });

        // Nothing arrives while the queue stays empty
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        // Release the consumer so the thread does not outlive the test
        queue.enqueue(Priority::Low, 0);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);
    }

    #[test]
    fn test_blocked_consumer_receives_item() {
        let queue = Arc::new(ConcurrentPriorityQueue::new());
        let (tx, rx) = mpsc::channel();

        let q = queue.clone();
        let handle = thread::spawn(move || {
            tx.send(()).unwrap();
            q.dequeue()
        });

        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        queue.enqueue(Priority::Normal, "payload".to_string());
        assert_eq!(handle.join().unwrap(), "payload");
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_try_dequeue() {
        let queue = ConcurrentPriorityQueue::new();
        assert!(queue.try_dequeue().is_none());

        queue.enqueue(Priority::Low, 1);
        queue.enqueue(Priority::High, 2);
        assert_eq!(queue.try_dequeue(), Some(2));
        assert_eq!(queue.try_dequeue(), Some(1));
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_dequeue_timeout() {
        let queue = ConcurrentPriorityQueue::new();
        assert!(queue.dequeue_timeout(Duration::from_millis(30)).is_none());

        queue.enqueue(Priority::Normal, 'a');
        assert_eq!(queue.dequeue_timeout(Duration::from_millis(30)), Some('a'));
    }

    #[test]
    fn test_dequeue_cancellable_returns_none_on_cancel() {
        let queue: Arc<ConcurrentPriorityQueue<u32>> = Arc::new(ConcurrentPriorityQueue::new());
        let token = CancellationToken::new();
        let mut handles = vec![];

        for _ in 0..3 {
            let q = queue.clone();
            let t = token.clone();
            handles.push(thread::spawn(move || q.dequeue_cancellable(&t)));
        }

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        for handle in handles {
            assert!(handle.join().unwrap().is_none());
        }
    }

    #[test]
    fn test_dequeue_cancellable_leaves_items_after_cancel() {
        let queue = ConcurrentPriorityQueue::new();
        let token = CancellationToken::new();

        queue.enqueue(Priority::High, 1);
        assert_eq!(queue.dequeue_cancellable(&token), Some(1));

        queue.enqueue(Priority::High, 2);
        token.cancel();
        assert!(queue.dequeue_cancellable(&token).is_none());
        assert_eq!(queue.count(), 1);
        assert_eq!(queue.dequeue(), 2);
    }

    #[test]
    fn test_no_lost_wakeups() {
        const K: usize = 16;
        let queue = Arc::new(ConcurrentPriorityQueue::new());
        let mut consumers = vec![];
        let mut producers = vec![];

        for _ in 0..K {
            let q = queue.clone();
            consumers.push(thread::spawn(move || q.dequeue()));
        }

        for i in 0..K {
            let q = queue.clone();
            producers.push(thread::spawn(move || {
                q.enqueue(Priority::ALL[i % 3], i);
            }));
        }

        for handle in producers {
            handle.join().unwrap();
        }

        let received: HashSet<usize> = consumers
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(received, (0..K).collect::<HashSet<_>>());
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_concurrent_producers_preserve_per_producer_fifo() {
        let queue = Arc::new(ConcurrentPriorityQueue::new());
        let mut handles = vec![];

        for producer in 0..4 {
            let q = queue.clone();
            handles.push(thread::spawn(move || {
                for seq in 0..25 {
                    q.enqueue(Priority::Normal, (producer, seq));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.count(), 100);

        let mut last_seq = [None::<u32>; 4];
        while let Some((producer, seq)) = queue.try_dequeue() {
            if let Some(prev) = last_seq[producer] {
                assert!(seq > prev);
            }
            last_seq[producer] = Some(seq);
        }
        assert!(last_seq.iter().all(|s| *s == Some(24)));
    }

    #[test]
    fn test_concurrent_enqueue_dequeue() {
        let queue = Arc::new(ConcurrentPriorityQueue::new());
        let processed = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        // Producer threads
        for i in 0..4 {
            let q = queue.clone();
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    q.enqueue(Priority::ALL[(i + j) % 3], format!("T{}-{}", i, j));
                    thread::sleep(Duration::from_micros(50));
                }
            }));
        }

        // Consumer threads, each taking a fixed share
        for _ in 0..2 {
            let q = queue.clone();
            let p = processed.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..20 {
                    q.dequeue();
                    p.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(processed.load(Ordering::SeqCst), 40);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_debug_shows_depths() {
        let queue = ConcurrentPriorityQueue::new();
        queue.enqueue(Priority::High, ());
        let debug = format!("{:?}", queue);
        assert!(debug.contains("high: 1"));
        assert!(debug.contains("low: 0"));
    }
}

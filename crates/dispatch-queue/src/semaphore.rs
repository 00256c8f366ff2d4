//! CountingSemaphore - blocks consumers until a producer signals.
//!
//! Built from a `Mutex<usize>` and a `Condvar`. Every `up()` adds one unit
//! and wakes one waiter; every successful `down()` takes exactly one unit.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;

/// Counter and wait queue shared with cancellation tokens.
#[derive(Debug, Default)]
pub(crate) struct SemaphoreShared {
    count: Mutex<usize>,
    available: Condvar,
}

impl SemaphoreShared {
    /// Locks the counter.
    ///
    /// The counter is a plain integer that is never left half-updated, so a
    /// poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes every waiter so it re-checks its exit condition.
    ///
    /// Taking the lock first orders the wake-up after any flag the caller
    /// set, so a waiter cannot miss it between its check and its wait.
    pub(crate) fn wake_all(&self) {
        let _guard = self.lock();
        self.available.notify_all();
    }
}

/// Counting semaphore with blocking, timed and cancellable waits.
///
/// # Example
///
/// ```
/// use dispatch_queue::CountingSemaphore;
/// use std::sync::Arc;
/// use std::thread;
///
/// let sem = Arc::new(CountingSemaphore::new(0));
/// let s = sem.clone();
/// let waiter = thread::spawn(move || s.down());
///
/// sem.up();
/// waiter.join().unwrap();
/// assert_eq!(sem.available(), 0);
/// ```
#[derive(Debug, Default)]
pub struct CountingSemaphore {
    shared: Arc<SemaphoreShared>,
}

impl CountingSemaphore {
    /// Creates a semaphore holding `initial` units.
    pub fn new(initial: usize) -> Self {
        Self {
            shared: Arc::new(SemaphoreShared {
                count: Mutex::new(initial),
                available: Condvar::new(),
            }),
        }
    }

    /// Adds one unit and wakes one waiter.
    pub fn up(&self) {
        let mut count = self.shared.lock();
        *count += 1;
        self.shared.available.notify_one();
    }

    /// Blocks until a unit is available, then takes it.
    ///
    /// Blocks forever if no matching `up()` ever happens.
    pub fn down(&self) {
        let mut count = self.shared.lock();
        while *count == 0 {
            count = self
                .shared
                .available
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
    }

    /// Takes a unit if one is available, without blocking.
    pub fn try_down(&self) -> bool {
        let mut count = self.shared.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Waits at most `timeout` for a unit.
    ///
    /// Returns false on timeout; the count is left untouched.
    pub fn down_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.down();
            return true;
        };

        let mut count = self.shared.lock();
        while *count == 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .shared
                .available
                .wait_timeout(count, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            count = guard;
        }
        *count -= 1;
        true
    }

    /// Waits for a unit until `token` is cancelled.
    ///
    /// Returns false without taking a unit once the token is cancelled,
    /// including when it was cancelled before the call.
    pub fn down_cancellable(&self, token: &CancellationToken) -> bool {
        token.register(&self.shared);

        let mut count = self.shared.lock();
        loop {
            if token.is_cancelled() {
                // Pass on a wake-up this waiter may have absorbed.
                if *count > 0 {
                    self.shared.available.notify_one();
                }
                return false;
            }
            if *count > 0 {
                *count -= 1;
                return true;
            }
            count = self
                .shared
                .available
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns the current number of units. Advisory only.
    pub fn available(&self) -> usize {
        *self.shared.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_initial_count() {
        let sem = CountingSemaphore::new(3);
        assert_eq!(sem.available(), 3);
        assert_eq!(CountingSemaphore::default().available(), 0);
    }

    #[test]
    fn test_up_down() {
        let sem = CountingSemaphore::new(0);
        sem.up();
        sem.up();
        assert_eq!(sem.available(), 2);

        sem.down();
        assert_eq!(sem.available(), 1);
    }

    #[test]
    fn test_try_down() {
        let sem = CountingSemaphore::new(1);
        assert!(sem.try_down());
        assert!(!sem.try_down());
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_down_blocks_until_up() {
        let sem = Arc::new(CountingSemaphore::new(0));
        let (tx, rx) = mpsc::channel();

        let s = sem.clone();
        let handle = thread::spawn(move || {
            s.down();
            tx.send(()).unwrap();
        });

        // Still blocked
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        sem.up();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_down_timeout_expires() {
        let sem = CountingSemaphore::new(0);
        let start = Instant::now();
        assert!(!sem.down_timeout(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_down_timeout_succeeds() {
        let sem = Arc::new(CountingSemaphore::new(0));

        let s = sem.clone();
        let handle = thread::spawn(move || s.down_timeout(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        sem.up();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_down_timeout_huge_duration() {
        let sem = CountingSemaphore::new(1);
        assert!(sem.down_timeout(Duration::MAX));
    }

    #[test]
    fn test_down_cancellable_unblocks_on_cancel() {
        let sem = Arc::new(CountingSemaphore::new(0));
        let token = CancellationToken::new();

        let s = sem.clone();
        let t = token.clone();
        let handle = thread::spawn(move || s.down_cancellable(&t));

        thread::sleep(Duration::from_millis(50));
        token.cancel();
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn test_down_cancellable_already_cancelled() {
        let sem = CountingSemaphore::new(1);
        let token = CancellationToken::new();
        token.cancel();

        assert!(!sem.down_cancellable(&token));
        assert_eq!(sem.available(), 1);
    }

    #[test]
    fn test_down_cancellable_takes_unit() {
        let sem = CountingSemaphore::new(1);
        let token = CancellationToken::new();
        assert!(sem.down_cancellable(&token));
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_cancelled_waiter_leaves_wakeup_for_plain_waiter() {
        let sem = Arc::new(CountingSemaphore::new(0));
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();

        let s = sem.clone();
        let plain = thread::spawn(move || {
            s.down();
            tx.send(()).unwrap();
        });

        let s = sem.clone();
        let t = token.clone();
        let cancellable = thread::spawn(move || s.down_cancellable(&t));

        // Both blocked
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());

        token.cancel();
        assert!(!cancellable.join().unwrap());

        sem.up();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        plain.join().unwrap();
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_up_racing_cancel_still_reaches_plain_waiter() {
        for _ in 0..50 {
            let sem = Arc::new(CountingSemaphore::new(0));
            let token = CancellationToken::new();
            let (tx, rx) = mpsc::channel();

            let s = sem.clone();
            let plain = thread::spawn(move || {
                s.down();
                tx.send(()).unwrap();
            });

            let s = sem.clone();
            let t = token.clone();
            let cancellable = thread::spawn(move || s.down_cancellable(&t));

            thread::sleep(Duration::from_millis(5));

            // The notify from up() may land on the cancellable waiter
            let t = token.clone();
            let canceller = thread::spawn(move || t.cancel());
            sem.up();
            canceller.join().unwrap();

            if cancellable.join().unwrap() {
                // It won the unit before seeing the cancel
                sem.up();
            }

            rx.recv_timeout(Duration::from_secs(5)).unwrap();
            plain.join().unwrap();
            assert_eq!(sem.available(), 0);
        }
    }

    #[test]
    fn test_each_up_wakes_exactly_one() {
        let sem = Arc::new(CountingSemaphore::new(0));
        let woken = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let s = sem.clone();
            let w = woken.clone();
            handles.push(thread::spawn(move || {
                s.down();
                w.fetch_add(1, Ordering::SeqCst);
            }));
        }

        for _ in 0..8 {
            sem.up();
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(woken.load(Ordering::SeqCst), 8);
        assert_eq!(sem.available(), 0);
    }
}

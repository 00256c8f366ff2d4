//! CancellationToken - shared flag that releases blocked consumers.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::semaphore::SemaphoreShared;

struct TokenInner {
    cancelled: AtomicBool,
    /// Semaphores with (possibly) waiting threads watching this token.
    waiters: Mutex<Vec<Weak<SemaphoreShared>>>,
}

/// Cloneable handle used to stop blocking waits.
///
/// All clones share one flag. `cancel()` sets it and wakes every semaphore
/// that has a thread waiting on this token.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                waiters: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancels the token and wakes all waiters. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let waiters = std::mem::take(
            &mut *self
                .inner
                .waiters
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for waiter in waiters.iter().filter_map(Weak::upgrade) {
            waiter.wake_all();
        }
    }

    /// Returns true once `cancel()` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Registers a semaphore to be woken on cancellation.
    ///
    /// Registration happens under the same lock `cancel()` drains, so a
    /// semaphore registered after the drain sees the flag already set.
    pub(crate) fn register(&self, semaphore: &Arc<SemaphoreShared>) {
        let mut waiters = self
            .inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.is_cancelled() {
            return;
        }

        waiters.retain(|w| w.strong_count() > 0);
        let weak = Arc::downgrade(semaphore);
        if !waiters.iter().any(|w| w.ptr_eq(&weak)) {
            waiters.push(weak);
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

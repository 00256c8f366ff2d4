//! Dispatcher - worker threads draining a shared priority queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dispatch_models::{ActionMessage, Priority};
use dispatch_queue::{CancellationToken, ConcurrentPriorityQueue};
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::error::{Result, WorkerError};
use crate::handler::MessageHandler;

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Messages passed to `submit`.
    pub submitted: usize,
    /// Messages the handler accepted.
    pub handled: usize,
    /// Messages the handler rejected.
    pub failed: usize,
    /// Accepted messages per level, indexed High, Normal, Low.
    pub handled_by_priority: [usize; 3],
    /// Rejected messages per level, indexed High, Normal, Low.
    pub failed_by_priority: [usize; 3],
}

impl DispatchStats {
    /// Returns handled plus failed.
    pub fn processed(&self) -> usize {
        self.handled + self.failed
    }

    /// Returns the number of accepted messages at one level.
    pub fn handled_at(&self, priority: Priority) -> usize {
        self.handled_by_priority[level_index(priority)]
    }

    /// Returns the number of rejected messages at one level.
    pub fn failed_at(&self, priority: Priority) -> usize {
        self.failed_by_priority[level_index(priority)]
    }

    /// Returns the number of processed messages at one level.
    pub fn processed_at(&self, priority: Priority) -> usize {
        self.handled_at(priority) + self.failed_at(priority)
    }
}

fn level_index(priority: Priority) -> usize {
    match priority {
        Priority::High => 0,
        Priority::Normal => 1,
        Priority::Low => 2,
    }
}

fn load_levels(levels: &[AtomicUsize; 3]) -> [usize; 3] {
    [
        levels[0].load(Ordering::SeqCst),
        levels[1].load(Ordering::SeqCst),
        levels[2].load(Ordering::SeqCst),
    ]
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicUsize,
    handled: AtomicUsize,
    failed: AtomicUsize,
    handled_by_priority: [AtomicUsize; 3],
    failed_by_priority: [AtomicUsize; 3],
}

impl Counters {
    fn record(&self, priority: Priority, ok: bool) {
        let level = level_index(priority);
        // Per-level first, so a snapshot never shows more totals than levels.
        if ok {
            self.handled_by_priority[level].fetch_add(1, Ordering::SeqCst);
            self.handled.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed_by_priority[level].fetch_add(1, Ordering::SeqCst);
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            handled: self.handled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            handled_by_priority: load_levels(&self.handled_by_priority),
            failed_by_priority: load_levels(&self.failed_by_priority),
        }
    }
}

/// Pool of worker threads that drain one shared action queue.
///
/// The queue is injected, not global: producers hold the same
/// `Arc<ConcurrentPriorityQueue<ActionMessage>>` (see `queue()`), and each
/// pool gets its own instance.
///
/// # Example
///
/// ```
/// use dispatch_worker::{Dispatcher, DispatcherConfig, HandlerError, MessageHandler};
/// use dispatch_models::{ActionKind, ActionMessage};
/// use dispatch_queue::ConcurrentPriorityQueue;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let queue = Arc::new(ConcurrentPriorityQueue::new());
/// let handler: Arc<dyn MessageHandler> = Arc::new(|msg: &ActionMessage| -> Result<(), HandlerError> {
///     println!("{} for {}", msg.kind, msg.tenant_id);
///     Ok(())
/// });
///
/// let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), queue, handler).unwrap();
/// dispatcher.start().unwrap();
/// dispatcher.submit(ActionMessage::new("tenant-1", ActionKind::Notification));
///
/// assert!(dispatcher.wait_idle(Duration::from_secs(5)));
/// dispatcher.shutdown().unwrap();
/// ```
pub struct Dispatcher {
    config: DispatcherConfig,
    queue: Arc<ConcurrentPriorityQueue<ActionMessage>>,
    handler: Arc<dyn MessageHandler>,
    /// Replaced on every start so a restarted pool is not born cancelled.
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Creates a dispatcher over `queue`. Workers start with `start()`.
    pub fn new(
        config: DispatcherConfig,
        queue: Arc<ConcurrentPriorityQueue<ActionMessage>>,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            queue,
            handler,
            token: CancellationToken::new(),
            workers: Vec::new(),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the shared queue for producers.
    pub fn queue(&self) -> Arc<ConcurrentPriorityQueue<ActionMessage>> {
        Arc::clone(&self.queue)
    }

    /// Returns true while worker threads are running.
    pub fn is_started(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Spawns the worker threads.
    pub fn start(&mut self) -> Result<()> {
        if self.is_started() {
            return Err(WorkerError::AlreadyStarted);
        }

        info!(workers = self.config.worker_count, "starting dispatcher");

        self.token = CancellationToken::new();

        for n in 0..self.config.worker_count {
            let queue = Arc::clone(&self.queue);
            let handler = Arc::clone(&self.handler);
            let token = self.token.clone();
            let counters = Arc::clone(&self.counters);

            let spawned = thread::Builder::new()
                .name(format!("dispatch-worker-{}", n))
                .spawn(move || run_worker(n, &queue, handler.as_ref(), &token, &counters));

            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(e) => {
                    // Unwind the partially started pool.
                    self.token.cancel();
                    for handle in self.workers.drain(..) {
                        let _ = handle.join();
                    }
                    return Err(WorkerError::Spawn(e));
                }
            }
        }

        debug!("dispatcher started");

        Ok(())
    }

    /// Queues a message at its own priority.
    pub fn submit(&self, message: ActionMessage) {
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        let priority = message.priority;
        self.queue.enqueue(priority, message);
    }

    /// Waits until every submitted message has been processed.
    ///
    /// Messages enqueued straight onto `queue()` are not tracked here.
    /// Returns false if `timeout` passes first. A timeout too large to
    /// represent as an `Instant` waits without a deadline.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let stats = self.stats();
            if stats.processed() >= stats.submitted {
                return true;
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.config.idle_check_interval.min(deadline - now)
                }
                None => self.config.idle_check_interval,
            };
            thread::sleep(pause);
        }
    }

    /// Stops the workers and waits for them to exit.
    ///
    /// A worker finishes the message it is handling before it stops.
    /// Queued messages stay in the queue; the number left is returned.
    pub fn shutdown(&mut self) -> Result<usize> {
        if !self.is_started() {
            return Err(WorkerError::NotStarted);
        }

        info!("shutting down dispatcher");

        self.token.cancel();

        let mut panicked = 0;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }

        let remaining = self.queue.count();
        info!(remaining, "dispatcher stopped");

        if panicked > 0 {
            return Err(WorkerError::Shutdown(format!(
                "{} worker thread(s) panicked",
                panicked
            )));
        }

        Ok(remaining)
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Release blocked workers; their threads exit on their own.
        if self.is_started() {
            self.token.cancel();
        }
    }
}

fn run_worker(
    id: usize,
    queue: &ConcurrentPriorityQueue<ActionMessage>,
    handler: &dyn MessageHandler,
    token: &CancellationToken,
    counters: &Counters,
) {
    debug!(worker = id, "worker started");

    while let Some(message) = queue.dequeue_cancellable(token) {
        debug!(
            worker = id,
            message_id = %message.id,
            tenant_id = %message.tenant_id,
            kind = %message.kind,
            priority = %message.priority,
            "handling message"
        );

        match handler.handle(&message) {
            Ok(()) => counters.record(message.priority, true),
            Err(e) => {
                warn!(
                    worker = id,
                    message_id = %message.id,
                    kind = %message.kind,
                    error = %e,
                    "message handler failed"
                );
                counters.record(message.priority, false);
            }
        }
    }

    debug!(worker = id, "worker stopped");
}

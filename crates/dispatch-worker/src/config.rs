//! Dispatcher configuration.

use std::time::Duration;

use crate::error::{Result, WorkerError};

/// Environment variable for the number of worker threads.
pub const WORKERS_ENV: &str = "DISPATCH_WORKERS";

/// Environment variable for the `wait_idle` check interval in milliseconds.
pub const IDLE_CHECK_MS_ENV: &str = "DISPATCH_IDLE_CHECK_MS";

/// Configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of worker threads draining the queue.
    pub worker_count: usize,
    /// How often `wait_idle` re-checks progress.
    pub idle_check_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            idle_check_interval: Duration::from_millis(250),
        }
    }
}

impl DispatcherConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from `DISPATCH_WORKERS` and `DISPATCH_IDLE_CHECK_MS`.
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(WORKERS_ENV) {
            config.worker_count = raw.trim().parse().map_err(|_| {
                WorkerError::Config(format!("{} must be a positive integer, got {:?}", WORKERS_ENV, raw))
            })?;
        }

        if let Some(raw) = lookup(IDLE_CHECK_MS_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                WorkerError::Config(format!("{} must be milliseconds, got {:?}", IDLE_CHECK_MS_ENV, raw))
            })?;
            config.idle_check_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the number of worker threads.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets how often `wait_idle` re-checks progress.
    pub fn with_idle_check_interval(mut self, interval: Duration) -> Self {
        self.idle_check_interval = interval;
        self
    }

    /// Checks that the config can run a dispatcher.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(WorkerError::Config("worker_count must be at least 1".to_string()));
        }
        if self.idle_check_interval.is_zero() {
            return Err(WorkerError::Config("idle_check_interval must be non-zero".to_string()));
        }
        Ok(())
    }
}

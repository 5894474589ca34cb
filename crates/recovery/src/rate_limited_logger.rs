//! Rate-limited warning logger for recovery log failures
//!
//! A full disk turns every emitted record into a failed log write. Warnings
//! are emitted at most once per interval, carrying the number of failures
//! suppressed in between.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between two warnings
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Warns at most once per interval and counts every failure
pub struct RateLimitedLogger {
    min_interval: Duration,
    last_warning: Mutex<Option<Instant>>,
    /// Failures since the last emitted warning
    pending: AtomicU64,
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger that warns at most once per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_warning: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a failure, emitting a warning if the interval has elapsed
    ///
    /// Returns true if a warning was emitted.
    pub fn warn(&self, context: &str, error: &dyn std::fmt::Display) -> bool {
        self.pending.fetch_add(1, Ordering::Relaxed);
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_emit() {
            return false;
        }

        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 1 {
            tracing::warn!(
                context = %context,
                error = %error,
                suppressed_count = count - 1,
                total_failures = total,
                "recovery log failure (rate-limited)"
            );
        } else {
            tracing::warn!(
                context = %context,
                error = %error,
                total_failures = total,
                "recovery log failure"
            );
        }
        true
    }

    fn should_emit(&self) -> bool {
        let mut last = self.last_warning.lock();
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Failures recorded since the last emitted warning
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// All failures ever recorded
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

impl std::fmt::Debug for RateLimitedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedLogger")
            .field("min_interval", &self.min_interval)
            .field("total", &self.total_count())
            .finish()
    }
}

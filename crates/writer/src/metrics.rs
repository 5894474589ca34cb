//! Record writer metrics
//!
//! Atomic counters updated on the emit path. All operations use relaxed
//! ordering; values read concurrently may be slightly stale.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one record writer
#[derive(Debug, Default)]
pub struct WriterMetrics {
    /// Records accepted by `emit` (after the replay filter)
    records_emitted: AtomicU64,

    /// Records dropped by the replay filter
    records_filtered: AtomicU64,

    /// Records whose selection was empty
    records_unrouted: AtomicU64,

    /// Non-empty buffers handed to the partition
    buffers_written: AtomicU64,

    /// Payload bytes in those buffers
    bytes_written: AtomicU64,

    /// Buffers recycled without being forwarded
    buffers_discarded: AtomicU64,

    /// Events written (one per channel per broadcast)
    events_written: AtomicU64,

    supersteps_ended: AtomicU64,

    recovery_records: AtomicU64,

    recovery_failures: AtomicU64,
}

impl WriterMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_emitted: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            records_unrouted: AtomicU64::new(0),
            buffers_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            buffers_discarded: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            supersteps_ended: AtomicU64::new(0),
            recovery_records: AtomicU64::new(0),
            recovery_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.records_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unrouted(&self) {
        self.records_unrouted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a buffer forwarded to the partition
    #[inline]
    pub fn record_buffer_written(&self, bytes: usize) {
        self.buffers_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_buffers_discarded(&self, count: u64) {
        self.buffers_discarded.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_event_written(&self) {
        self.events_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_superstep_ended(&self) {
        self.supersteps_ended.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_recovery_logged(&self) {
        self.recovery_records.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_recovery_failure(&self) {
        self.recovery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            records_filtered: self.records_filtered.load(Ordering::Relaxed),
            records_unrouted: self.records_unrouted.load(Ordering::Relaxed),
            buffers_written: self.buffers_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            buffers_discarded: self.buffers_discarded.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            supersteps_ended: self.supersteps_ended.load(Ordering::Relaxed),
            recovery_records: self.recovery_records.load(Ordering::Relaxed),
            recovery_failures: self.recovery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `WriterMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_emitted: u64,
    pub records_filtered: u64,
    pub records_unrouted: u64,
    pub buffers_written: u64,
    pub bytes_written: u64,
    pub buffers_discarded: u64,
    pub events_written: u64,
    pub supersteps_ended: u64,
    pub recovery_records: u64,
    pub recovery_failures: u64,
}

impl MetricsSnapshot {
    /// Average fill of forwarded buffers in bytes
    pub fn average_buffer_fill(&self) -> f64 {
        if self.buffers_written == 0 {
            0.0
        } else {
            self.bytes_written as f64 / self.buffers_written as f64
        }
    }
}

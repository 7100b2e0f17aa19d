//! Per-store metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single store
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total inserted records
    insert_count: AtomicU64,
    /// Total duplicate-id no-ops
    duplicate_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Total readings dropped due to full queue
    dropped_count: AtomicU64,
}

impl StoreMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get total insert count
    pub fn insert_count(&self) -> u64 {
        self.insert_count.load(Ordering::Relaxed)
    }

    /// Increment insert count
    pub fn inc_insert_count(&self) {
        self.insert_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get duplicate count
    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count.load(Ordering::Relaxed)
    }

    /// Increment duplicate count
    pub fn inc_duplicate_count(&self) {
        self.duplicate_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            insert_count: self.insert_count(),
            duplicate_count: self.duplicate_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of store metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub insert_count: u64,
    pub duplicate_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

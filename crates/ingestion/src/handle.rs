//! StoreHandle - manages a store with isolated queue and worker task
//!
//! One worker task per store serializes all writes to that store
//! resource; different stores never block each other.

use metrics::counter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Reading, StoreWriter, WriteOutcome};

use crate::metrics::StoreMetrics;

/// Handle to a running store worker
pub struct StoreHandle {
    /// Store name
    name: String,
    /// Channel to send readings to worker
    tx: mpsc::Sender<Reading>,
    /// Shared metrics
    metrics: Arc<StoreMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl StoreHandle {
    /// Create a new StoreHandle and spawn the worker task
    pub fn spawn<S: StoreWriter + Send + 'static>(store: S, queue_capacity: usize) -> Self {
        let name = store.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(StoreMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            store_worker(store, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<StoreMetrics> {
        &self.metrics
    }

    /// Send a reading to the store (non-blocking)
    ///
    /// Returns true if sent, false if queue full (reading dropped)
    pub fn try_send(&self, reading: Reading) -> bool {
        match self.tx.try_send(reading) {
            Ok(()) => {
                // Update queue length approximation
                self.metrics.set_queue_len(self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    store = %self.name,
                    reading_id = r.id,
                    "Queue full, reading dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(store = %self.name, "Store worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the store worker gracefully, flushing pending writes
    #[instrument(name = "store_handle_shutdown", skip(self))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        // Wait for worker to drain and finish
        if let Err(e) = self.worker_handle.await {
            error!(store = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(store = %self.name, "StoreHandle shutdown complete");
    }
}

/// Worker task that consumes readings and writes to the store
#[instrument(
    name = "store_worker_loop",
    skip(store, rx, metrics),
    fields(store = %name)
)]
async fn store_worker<S: StoreWriter>(
    mut store: S,
    mut rx: mpsc::Receiver<Reading>,
    metrics: Arc<StoreMetrics>,
    name: String,
) {
    debug!(store = %name, "Store worker started");

    while let Some(reading) = rx.recv().await {
        // Update queue length
        metrics.set_queue_len(rx.len());

        match store.write(&reading).await {
            Ok(WriteOutcome::Inserted) => {
                metrics.inc_insert_count();
                counter!("waterline_store_writes_total", "store" => name.clone(), "status" => "inserted")
                    .increment(1);
            }
            Ok(WriteOutcome::Duplicate) => {
                // Expected under at-least-once delivery: count it, move on
                metrics.inc_duplicate_count();
                counter!("waterline_store_writes_total", "store" => name.clone(), "status" => "duplicate")
                    .increment(1);
                debug!(
                    store = %name,
                    reading_id = reading.id,
                    "Duplicate id skipped"
                );
            }
            Err(e) => {
                metrics.inc_failure_count();
                counter!("waterline_store_writes_total", "store" => name.clone(), "status" => "failure")
                    .increment(1);
                error!(
                    store = %name,
                    reading_id = reading.id,
                    error = %e,
                    "Write failed"
                );
                // Continue processing - don't crash on single failure
            }
        }
    }

    // Cleanup
    if let Err(e) = store.flush().await {
        error!(store = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = store.close().await {
        error!(store = %name, error = %e, "Close failed on shutdown");
    }

    debug!(store = %name, "Store worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::{PoleId, TelemetryError};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock store for testing
    struct MockStore {
        name: String,
        write_count: Arc<AtomicU64>,
        seen: HashSet<u64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl StoreWriter for MockStore {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(TelemetryError::store_write(&self.name, "mock failure"));
            }
            if !self.seen.insert(reading.id) {
                return Ok(WriteOutcome::Duplicate);
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(WriteOutcome::Inserted)
        }

        async fn flush(&mut self) -> Result<(), TelemetryError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    fn reading(id: u64) -> Reading {
        Reading {
            id,
            pole_id: PoleId::new(1).unwrap(),
            water_level: 2.0,
            observed_at: NaiveDate::from_ymd_opt(2025, 11, 29)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_store_handle_basic() {
        let write_count = Arc::new(AtomicU64::new(0));
        let store = MockStore {
            name: "test".to_string(),
            write_count: Arc::clone(&write_count),
            seen: HashSet::new(),
            should_fail: false,
            delay_ms: 0,
        };

        let handle = StoreHandle::spawn(store, 10);

        for i in 0..5 {
            assert!(handle.try_send(reading(i)));
        }

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn test_store_handle_counts_duplicates() {
        let write_count = Arc::new(AtomicU64::new(0));
        let store = MockStore {
            name: "dups".to_string(),
            write_count: Arc::clone(&write_count),
            seen: HashSet::new(),
            should_fail: false,
            delay_ms: 0,
        };

        let handle = StoreHandle::spawn(store, 10);
        let metrics = Arc::clone(handle.metrics());

        handle.try_send(reading(7));
        handle.try_send(reading(7));
        handle.try_send(reading(8));

        handle.shutdown().await;

        assert_eq!(write_count.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.duplicate_count(), 1);
        assert_eq!(metrics.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_store_handle_queue_full() {
        let store = MockStore {
            name: "slow".to_string(),
            write_count: Arc::new(AtomicU64::new(0)),
            seen: HashSet::new(),
            should_fail: false,
            delay_ms: 100, // Slow store
        };

        // Small queue capacity
        let handle = StoreHandle::spawn(store, 2);

        for i in 0..10 {
            handle.try_send(reading(i));
        }

        // Some should have been dropped
        assert!(handle.metrics().dropped_count() > 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_store_handle_failure_isolation() {
        let store = MockStore {
            name: "failing".to_string(),
            write_count: Arc::new(AtomicU64::new(0)),
            seen: HashSet::new(),
            should_fail: true,
            delay_ms: 0,
        };

        let handle = StoreHandle::spawn(store, 10);

        for i in 0..3 {
            handle.try_send(reading(i));
        }

        // Give worker time to process
        sleep(Duration::from_millis(50)).await;

        // Should have recorded failures
        assert!(handle.metrics().failure_count() > 0);

        handle.shutdown().await;
    }
}

//! Ingestor - main loop from decoded readings to durable stores
//!
//! Validates each reading against its pole's physical range, then fans
//! out to every configured store. Each store has its own worker queue,
//! so one slow store never blocks the rest.

use async_channel::Receiver;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{LevelBounds, PoleConfig, PoleId, Reading, StoreConfig, StoreType};
use std::collections::HashMap;

use crate::error::IngestError;
use crate::handle::StoreHandle;
use crate::metrics::MetricsSnapshot;
use crate::stores::{JsonSnapshotStore, LogStore, SqliteStore};

/// Ingestor configuration
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// Store configurations
    pub stores: Vec<StoreConfig>,
    /// Physical range per pole; readings from unknown poles are rejected
    pub bounds: HashMap<PoleId, LevelBounds>,
}

impl IngestorConfig {
    /// Build from blueprint sections
    pub fn new(stores: Vec<StoreConfig>, poles: &[PoleConfig]) -> Self {
        let bounds = poles.iter().map(|p| (p.id, p.bounds())).collect();
        Self { stores, bounds }
    }
}

/// Builder for creating an Ingestor
pub struct IngestorBuilder {
    config: IngestorConfig,
    input_rx: Receiver<Reading>,
}

impl IngestorBuilder {
    /// Create a new IngestorBuilder
    pub fn new(config: IngestorConfig, input_rx: Receiver<Reading>) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the ingestor
    #[instrument(name = "ingestor_builder_build", skip(self))]
    pub fn build(self) -> Result<Ingestor, IngestError> {
        let handles = Self::initialize_handles(&self.config)?;

        Ok(Ingestor {
            handles,
            bounds: self.config.bounds,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "ingestor_initialize_handles",
        skip(config),
        fields(store_count = config.stores.len())
    )]
    fn initialize_handles(config: &IngestorConfig) -> Result<Vec<StoreHandle>, IngestError> {
        let mut handles = Vec::with_capacity(config.stores.len());
        for store_config in &config.stores {
            handles.push(create_store_handle(store_config)?);
        }
        Ok(handles)
    }
}

/// Create a StoreHandle from configuration
#[instrument(
    name = "ingestor_create_store_handle",
    skip(config),
    fields(store = %config.name, store_type = ?config.store_type)
)]
fn create_store_handle(config: &StoreConfig) -> Result<StoreHandle, IngestError> {
    match config.store_type {
        StoreType::Log => {
            let store = LogStore::new(&config.name);
            Ok(StoreHandle::spawn(store, config.queue_capacity))
        }
        StoreType::Json => {
            let store = JsonSnapshotStore::from_params(&config.name, &config.params)
                .map_err(|e| IngestError::store_creation(&config.name, e.to_string()))?;
            Ok(StoreHandle::spawn(store, config.queue_capacity))
        }
        StoreType::Sqlite => {
            let store = SqliteStore::from_params(&config.name, &config.params)
                .map_err(|e| IngestError::store_creation(&config.name, e.to_string()))?;
            Ok(StoreHandle::spawn(store, config.queue_capacity))
        }
    }
}

/// The main Ingestor that fans readings out to stores
pub struct Ingestor {
    handles: Vec<StoreHandle>,
    bounds: HashMap<PoleId, LevelBounds>,
    input_rx: Receiver<Reading>,
}

impl Ingestor {
    /// Create an ingestor with custom store handles (for testing)
    pub fn with_handles(
        handles: Vec<StoreHandle>,
        bounds: HashMap<PoleId, LevelBounds>,
        input_rx: Receiver<Reading>,
    ) -> Self {
        Self {
            handles,
            bounds,
            input_rx,
        }
    }

    /// Get metrics for all stores
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the ingestor main loop
    ///
    /// Consumes readings from input and fans out to all stores.
    /// Returns when the input channel is closed; store queues are drained
    /// and flushed before the call returns.
    #[instrument(name = "ingestor_run", skip(self))]
    pub async fn run(self) -> Vec<(String, MetricsSnapshot)> {
        info!(stores = self.handles.len(), "Ingestor started");

        let mut reading_count: u64 = 0;
        let mut rejected_count: u64 = 0;

        while let Ok(reading) = self.input_rx.recv().await {
            if !self.accept(&reading) {
                rejected_count += 1;
                continue;
            }

            reading_count += 1;
            self.fan_out(&reading);

            if reading_count.is_multiple_of(100) {
                debug!(readings = reading_count, "Ingestor progress");
            }
        }

        info!(
            readings = reading_count,
            rejected = rejected_count,
            "Ingestor input closed, shutting down"
        );

        let stats = Self::shutdown_handles(self.handles).await;

        info!("Ingestor shutdown complete");
        stats
    }

    /// Spawn the ingestor as a background task
    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Validate a reading before it reaches any store.
    ///
    /// An out-of-range level or unknown pole means the reading is
    /// invalid; it is rejected here, never passed through.
    fn accept(&self, reading: &Reading) -> bool {
        let Some(bounds) = self.bounds.get(&reading.pole_id) else {
            counter!("waterline_readings_rejected_total").increment(1);
            warn!(
                pole_id = %reading.pole_id,
                reading_id = reading.id,
                "rejecting reading from unknown pole"
            );
            return false;
        };

        if let Err(e) = reading.validate(bounds) {
            counter!("waterline_readings_rejected_total").increment(1);
            warn!(reading_id = reading.id, error = %e, "rejecting out-of-range reading");
            return false;
        }

        true
    }

    fn fan_out(&self, reading: &Reading) {
        for handle in &self.handles {
            handle.try_send(reading.clone());
        }
    }

    async fn shutdown_handles(handles: Vec<StoreHandle>) -> Vec<(String, MetricsSnapshot)> {
        let mut stats = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let metrics = std::sync::Arc::clone(handle.metrics());
            // Drain and flush first so the snapshot reflects every queued write
            handle.shutdown().await;
            stats.push((name, metrics.snapshot()));
        }
        stats
    }
}

/// Convenience function to create an ingestor from blueprint sections
#[instrument(name = "ingestor_create", skip(stores, poles, input_rx))]
pub fn create_ingestor(
    stores: Vec<StoreConfig>,
    poles: &[PoleConfig],
    input_rx: Receiver<Reading>,
) -> Result<Ingestor, IngestError> {
    let config = IngestorConfig::new(stores, poles);
    IngestorBuilder::new(config, input_rx).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn reading(id: u64, pole: u16, level: f64) -> Reading {
        Reading {
            id,
            pole_id: PoleId::new(pole).unwrap(),
            water_level: level,
            observed_at: NaiveDate::from_ymd_opt(2025, 11, 29)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    fn bounds_for(pole: u16) -> HashMap<PoleId, LevelBounds> {
        let mut bounds = HashMap::new();
        bounds.insert(PoleId::new(pole).unwrap(), LevelBounds::new(0.0, 8.0));
        bounds
    }

    #[tokio::test]
    async fn test_ingestor_fanout() {
        let (input_tx, input_rx) = async_channel::bounded(10);

        let handles = vec![
            StoreHandle::spawn(LogStore::new("store1"), 10),
            StoreHandle::spawn(LogStore::new("store2"), 10),
        ];

        let ingestor = Ingestor::with_handles(handles, bounds_for(1), input_rx);
        let handle = ingestor.spawn();

        for i in 0..5 {
            input_tx.send(reading(i + 1, 1, 2.0)).await.unwrap();
        }

        // Close input channel
        drop(input_tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats.len(), 2);
        for (_, snapshot) in stats {
            assert_eq!(snapshot.insert_count, 5);
        }
    }

    #[tokio::test]
    async fn test_ingestor_rejects_out_of_range() {
        let (input_tx, input_rx) = async_channel::bounded(10);
        let handles = vec![StoreHandle::spawn(LogStore::new("store"), 10)];
        let ingestor = Ingestor::with_handles(handles, bounds_for(1), input_rx);
        let handle = ingestor.spawn();

        input_tx.send(reading(1, 1, 2.0)).await.unwrap();
        input_tx.send(reading(2, 1, 9.5)).await.unwrap(); // above max
        input_tx.send(reading(3, 2, 2.0)).await.unwrap(); // unknown pole
        drop(input_tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats[0].1.insert_count, 1);
    }

    #[tokio::test]
    async fn test_create_ingestor_from_config() {
        let (input_tx, input_rx) = async_channel::bounded(10);

        let stores = vec![StoreConfig {
            name: "test_log".to_string(),
            store_type: StoreType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];
        let poles: Vec<PoleConfig> = vec![PoleConfig {
            id: PoleId::new(1).unwrap(),
            min_level: 0.0,
            max_level: 8.0,
            initial_level: None,
            trend_range: 0.2,
            noise_amplitude: 0.05,
            flip_probability: 0.1,
        }];

        let ingestor = create_ingestor(stores, &poles, input_rx).unwrap();
        let handle = ingestor.spawn();

        input_tx.send(reading(1, 1, 4.0)).await.unwrap();
        drop(input_tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats[0].1.insert_count, 1);
    }
}

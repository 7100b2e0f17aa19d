//! LogStore - logs each reading via tracing
//!
//! Debug aid mirroring a plain console subscriber; nothing is persisted.

use contracts::{Reading, StoreWriter, TelemetryError, WriteOutcome};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Store that logs reading summaries for debugging
pub struct LogStore {
    name: String,
    seen: HashSet<u64>,
}

impl LogStore {
    /// Create a new LogStore with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: HashSet::new(),
        }
    }

    fn log_reading(&self, reading: &Reading) {
        info!(
            store = %self.name,
            reading_id = reading.id,
            pole_id = %reading.pole_id,
            level = reading.water_level,
            observed_at = %reading.observed_at,
            "Reading received"
        );
    }
}

impl StoreWriter for LogStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_store_write",
        skip(self, reading),
        fields(store = %self.name, reading_id = reading.id)
    )]
    async fn write(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
        if !self.seen.insert(reading.id) {
            return Ok(WriteOutcome::Duplicate);
        }
        self.log_reading(reading);
        Ok(WriteOutcome::Inserted)
    }

    #[instrument(name = "log_store_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), TelemetryError> {
        // Nothing to flush for log store
        Ok(())
    }

    #[instrument(name = "log_store_close", skip(self))]
    async fn close(&mut self) -> Result<(), TelemetryError> {
        info!(store = %self.name, "LogStore closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::PoleId;

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
    async fn test_log_store_write() {
        let mut store = LogStore::new("test_log");
        assert_eq!(
            store.write(&reading(1)).await.unwrap(),
            WriteOutcome::Inserted
        );
        assert_eq!(
            store.write(&reading(1)).await.unwrap(),
            WriteOutcome::Duplicate
        );
    }

    #[tokio::test]
    async fn test_log_store_name() {
        let store = LogStore::new("my_logger");
        assert_eq!(store.name(), "my_logger");
    }
}

//! JsonSnapshotStore - atomic-replace JSON snapshot of all readings
//!
//! The snapshot is a JSON array of canonical Reading objects, fully
//! rewritten on every update. The rewrite goes to a temp file in the
//! same directory and is renamed over the target, so a concurrent
//! reader always sees a complete document.

use contracts::{Reading, StoreWriter, TelemetryError, WriteOutcome};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for JsonSnapshotStore
#[derive(Debug, Clone)]
pub struct JsonSnapshotConfig {
    /// Snapshot file path
    pub path: PathBuf,
}

impl JsonSnapshotConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        params
            .get("path")
            .map(|p| Self {
                path: PathBuf::from(p),
            })
    }
}

/// Store that materializes every reading into one JSON document
pub struct JsonSnapshotStore {
    name: String,
    path: PathBuf,
    tmp_path: PathBuf,
    readings: Vec<Reading>,
    seen: HashSet<u64>,
}

impl JsonSnapshotStore {
    /// Create a new JsonSnapshotStore
    ///
    /// The snapshot starts empty: the file is (re)written as `[]` so a
    /// reader can pick it up from the first moment of the run.
    pub fn new(name: impl Into<String>, config: JsonSnapshotConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Temp file lives next to the target so the rename stays on one
        // filesystem (rename across filesystems is not atomic).
        let mut tmp_name = config.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = config.path.with_file_name(tmp_name);

        let mut store = Self {
            name: name.into(),
            path: config.path,
            tmp_path,
            readings: Vec::new(),
            seen: HashSet::new(),
        };
        store.persist()?;
        Ok(store)
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = JsonSnapshotConfig::from_params(params).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })?;
        Self::new(name, config)
    }

    /// Number of readings currently in the snapshot
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn persist(&mut self) -> std::io::Result<()> {
        let raw = serde_json::to_vec_pretty(&self.readings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.tmp_path, raw)?;
        fs::rename(&self.tmp_path, &self.path)?;
        Ok(())
    }

    fn append(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
        if !self.seen.insert(reading.id) {
            return Ok(WriteOutcome::Duplicate);
        }

        self.readings.push(reading.clone());
        self.persist().map_err(|e| {
            error!(store = %self.name, reading_id = reading.id, error = %e, "Snapshot write failed");
            // Roll the record back so a later redelivery can retry it
            self.readings.pop();
            self.seen.remove(&reading.id);
            TelemetryError::store_write(&self.name, e.to_string())
        })?;

        Ok(WriteOutcome::Inserted)
    }
}

impl StoreWriter for JsonSnapshotStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_store_write",
        skip(self, reading),
        fields(store = %self.name, reading_id = reading.id)
    )]
    async fn write(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
        self.append(reading)
    }

    #[instrument(name = "json_store_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), TelemetryError> {
        // Every write is a full rewrite; nothing is buffered
        Ok(())
    }

    #[instrument(name = "json_store_close", skip(self))]
    async fn close(&mut self) -> Result<(), TelemetryError> {
        debug!(store = %self.name, readings = self.readings.len(), "JsonSnapshotStore closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::PoleId;
    use tempfile::tempdir;

    fn reading(id: u64, level: f64) -> Reading {
        Reading {
            id,
            pole_id: PoleId::new(1).unwrap(),
            water_level: level,
            observed_at: NaiveDate::from_ymd_opt(2025, 11, 29)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_starts_empty_and_grows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = JsonSnapshotStore::new(
            "snap",
            JsonSnapshotConfig { path: path.clone() },
        )
        .unwrap();

        // Created empty at startup
        let initial: Vec<Reading> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(initial.is_empty());

        store.write(&reading(1, 2.0)).await.unwrap();
        store.write(&reading(2, 2.1)).await.unwrap();

        let stored: Vec<Reading> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, 1);
        assert_eq!(stored[1].water_level, 2.1);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store =
            JsonSnapshotStore::new("snap", JsonSnapshotConfig { path: path.clone() }).unwrap();

        assert_eq!(
            store.write(&reading(7, 4.52)).await.unwrap(),
            WriteOutcome::Inserted
        );
        assert_eq!(
            store.write(&reading(7, 4.52)).await.unwrap(),
            WriteOutcome::Duplicate
        );

        let stored: Vec<Reading> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 7);
        assert_eq!(stored[0].water_level, 4.52);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store =
            JsonSnapshotStore::new("snap", JsonSnapshotConfig { path: path.clone() }).unwrap();

        store.write(&reading(1, 2.0)).await.unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("data.json")]);
    }

    #[test]
    fn test_from_params_requires_path() {
        assert!(JsonSnapshotStore::from_params("snap", &HashMap::new()).is_err());
    }
}

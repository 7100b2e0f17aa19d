//! SqliteStore - one row per reading, keyed by id
//!
//! Idempotency is the table's job: `id` is the primary key and inserts
//! use `INSERT OR IGNORE`, so a redelivered reading is a no-op the
//! engine reports as zero affected rows.

use contracts::{timestamp, Reading, StoreWriter, TelemetryError, WriteOutcome};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS readings (
    id          INTEGER PRIMARY KEY,
    pole_id     INTEGER NOT NULL,
    water_level REAL    NOT NULL,
    observed_at TEXT    NOT NULL
)";

const INSERT_READING: &str = "
INSERT OR IGNORE INTO readings (id, pole_id, water_level, observed_at)
VALUES (?1, ?2, ?3, ?4)";

/// Store backed by a SQLite database file
pub struct SqliteStore {
    name: String,
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database and ensure the readings table exists
    pub fn new(name: impl Into<String>, path: &Path) -> Result<Self, TelemetryError> {
        let name = name.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TelemetryError::store_connection(&name, e.to_string()))?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| TelemetryError::store_connection(&name, e.to_string()))?;
        conn.execute_batch(CREATE_TABLE)
            .map_err(|e| TelemetryError::store_connection(&name, e.to_string()))?;

        Ok(Self { name, conn })
    }

    /// Open an in-memory database (tests)
    pub fn in_memory(name: impl Into<String>) -> Result<Self, TelemetryError> {
        let name = name.into();
        let conn = Connection::open_in_memory()
            .map_err(|e| TelemetryError::store_connection(&name, e.to_string()))?;
        conn.execute_batch(CREATE_TABLE)
            .map_err(|e| TelemetryError::store_connection(&name, e.to_string()))?;
        Ok(Self { name, conn })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, TelemetryError> {
        let name = name.into();
        let path = params.get("path").map(PathBuf::from).ok_or_else(|| {
            TelemetryError::store_connection(&name, "missing 'path' parameter")
        })?;
        Self::new(name, &path)
    }

    /// Number of stored readings
    pub fn count(&self) -> Result<u64, TelemetryError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| TelemetryError::store_write(&self.name, e.to_string()))
    }

    fn insert(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
        let affected = self
            .conn
            .execute(
                INSERT_READING,
                params![
                    reading.id as i64,
                    i64::from(reading.pole_id.get()),
                    reading.water_level,
                    reading.observed_at.format(timestamp::FORMAT).to_string(),
                ],
            )
            .map_err(|e| TelemetryError::store_write(&self.name, e.to_string()))?;

        if affected == 0 {
            Ok(WriteOutcome::Duplicate)
        } else {
            Ok(WriteOutcome::Inserted)
        }
    }
}

impl StoreWriter for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "sqlite_store_write",
        skip(self, reading),
        fields(store = %self.name, reading_id = reading.id)
    )]
    async fn write(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError> {
        self.insert(reading)
    }

    #[instrument(name = "sqlite_store_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), TelemetryError> {
        // Autocommit connection; every insert is already durable
        Ok(())
    }

    #[instrument(name = "sqlite_store_close", skip(self))]
    async fn close(&mut self) -> Result<(), TelemetryError> {
        debug!(store = %self.name, "SqliteStore closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::PoleId;
    use tempfile::tempdir;

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

    #[tokio::test]
    async fn test_insert_and_count() {
        let mut store = SqliteStore::in_memory("db").unwrap();

        assert_eq!(
            store.write(&reading(1, 1, 2.0)).await.unwrap(),
            WriteOutcome::Inserted
        );
        assert_eq!(
            store.write(&reading(2, 2, 4.5)).await.unwrap(),
            WriteOutcome::Inserted
        );
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_ignored_not_errored() {
        let mut store = SqliteStore::in_memory("db").unwrap();

        store.write(&reading(7, 1, 4.52)).await.unwrap();
        let outcome = store.write(&reading(7, 1, 4.52)).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Duplicate);
        assert_eq!(store.count().unwrap(), 1);

        let level: f64 = store
            .conn
            .query_row("SELECT water_level FROM readings WHERE id = 7", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(level, 4.52);
    }

    #[tokio::test]
    async fn test_observed_at_stored_in_pinned_format() {
        let mut store = SqliteStore::in_memory("db").unwrap();
        store.write(&reading(1, 1, 2.0)).await.unwrap();

        let observed_at: String = store
            .conn
            .query_row("SELECT observed_at FROM readings WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(observed_at, "2025-11-29T10:00:00");
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.db");

        {
            let mut store = SqliteStore::new("db", &path).unwrap();
            store.write(&reading(1, 1, 2.0)).await.unwrap();
        }

        let store = SqliteStore::new("db", &path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}

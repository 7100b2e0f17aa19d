//! # Ingestion
//!
//! Persistence module: readings in, durable records out.
//!
//! Responsibilities:
//! - Validate readings against per-pole physical ranges
//! - Fan out to stores, one isolated worker queue per store
//! - Enforce idempotency (duplicate ids are successful no-ops)
//! - Atomic snapshot replacement for the file store

pub mod error;
pub mod handle;
pub mod ingestor;
pub mod metrics;
pub mod stores;

pub use contracts::{Reading, StoreWriter, WriteOutcome};
pub use error::IngestError;
pub use handle::StoreHandle;
pub use ingestor::{create_ingestor, Ingestor, IngestorBuilder, IngestorConfig};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use stores::{JsonSnapshotConfig, JsonSnapshotStore, LogStore, SqliteStore};

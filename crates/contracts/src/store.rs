//! StoreWriter trait - IngestWriter output interface
//!
//! Defines the abstract interface for durable stores.

use crate::{Reading, TelemetryError};

/// Result of a store write.
///
/// A duplicate `id` is the expected at-least-once redelivery signal, not
/// an error: the write is a successful no-op and callers only need the
/// distinction for accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new record was persisted
    Inserted,
    /// A record with the same `id` already exists; nothing was written
    Duplicate,
}

/// Durable store trait
///
/// All store implementations must implement this trait. Each store
/// instance is driven by a single worker task, so writes to one store
/// resource are serialized by construction.
#[trait_variant::make(StoreWriter: Send)]
pub trait LocalStoreWriter {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one reading
    ///
    /// # Errors
    /// Returns a store error (should include context). A duplicate `id`
    /// is NOT an error; it returns `Ok(WriteOutcome::Duplicate)`.
    async fn write(&mut self, reading: &Reading) -> Result<WriteOutcome, TelemetryError>;

    /// Flush buffered state (if any)
    async fn flush(&mut self) -> Result<(), TelemetryError>;

    /// Close the store
    async fn close(&mut self) -> Result<(), TelemetryError>;
}

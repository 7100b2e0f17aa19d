//! Ingestion error types

use thiserror::Error;

/// Ingestion-specific errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Store creation error
    #[error("failed to create store '{name}': {message}")]
    StoreCreation { name: String, message: String },

    /// Queue full - reading dropped
    #[error("queue full for store '{store_name}', reading {reading_id} dropped")]
    QueueFull { store_name: String, reading_id: u64 },

    /// Store write error (from contract)
    #[error("store error: {0}")]
    Contract(#[from] contracts::TelemetryError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Create a store creation error
    pub fn store_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}

//! Layered error definitions
//!
//! Categorized by source: config / transport / decode / store

use thiserror::Error;

use crate::PoleId;

/// Unified error type
#[derive(Debug, Error)]
pub enum TelemetryError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Broker connection error (transient, retried with backoff)
    #[error("transport connection error: {message}")]
    TransportConnection { message: String },

    /// Publish to a topic failed
    #[error("transport publish error on '{topic}': {message}")]
    TransportPublish { topic: String, message: String },

    /// Subscribe failed
    #[error("transport subscribe error on '{topic}': {message}")]
    TransportSubscribe { topic: String, message: String },

    // ===== Decode Errors =====
    /// Inbound message does not parse into a valid Reading.
    /// Local to the subscriber: logged and dropped, never fatal.
    #[error("payload decode error on '{topic}': {message}")]
    PayloadDecode { topic: String, message: String },

    /// Reading outside the pole's configured physical range
    #[error("reading out of range for pole {pole_id}: level {level} not in [{min}, {max}]")]
    OutOfRange {
        pole_id: PoleId,
        level: f64,
        min: f64,
        max: f64,
    },

    // ===== Store Errors =====
    /// Store write error (not the duplicate-id case, which is a no-op outcome)
    #[error("store '{store_name}' write error: {message}")]
    StoreWrite { store_name: String, message: String },

    /// Store connection/open error
    #[error("store '{store_name}' connection error: {message}")]
    StoreConnection { store_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TelemetryError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport connection error
    pub fn transport_connection(message: impl Into<String>) -> Self {
        Self::TransportConnection {
            message: message.into(),
        }
    }

    /// Create transport publish error
    pub fn transport_publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportPublish {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create payload decode error
    pub fn payload_decode(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create store write error
    pub fn store_write(store_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            store_name: store_name.into(),
            message: message.into(),
        }
    }

    /// Create store connection error
    pub fn store_connection(store_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreConnection {
            store_name: store_name.into(),
            message: message.into(),
        }
    }
}

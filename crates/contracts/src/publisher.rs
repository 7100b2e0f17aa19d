//! ReadingPublisher trait - Simulator output seam
//!
//! Decouples the simulator from the concrete transport so tests can use
//! a channel-backed publisher instead of a broker.

use crate::{Reading, TelemetryError};

/// Publishes one reading to the transport.
///
/// Stateless between calls: an implementation holds a transport handle
/// but no per-reading state. Delivery quality is at-least-once; the call
/// resolves once the transport has accepted the message for its broker.
#[trait_variant::make(ReadingPublisher: Send)]
pub trait LocalReadingPublisher {
    /// Publish one reading, addressed by its pole's topic.
    ///
    /// # Errors
    /// Transient transport failures surface as `TransportPublish`/
    /// `TransportConnection`; the caller decides the retry policy.
    async fn publish(&self, reading: &Reading) -> Result<(), TelemetryError>;
}

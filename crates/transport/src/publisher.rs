//! MqttPublisher - hands readings to the broker, one topic per pole

use std::time::Duration;

use contracts::{BrokerConfig, Reading, ReadingPublisher, TelemetryError};
use rumqttc::{AsyncClient, EventLoop, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::{codec, connection, topic};

/// Publisher over MQTT with QoS 1 (at-least-once).
///
/// Holds no state between calls beyond the client handle; the broker
/// acknowledgement is handled by the background event loop task.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Connect to the broker and spawn the event loop driver.
    ///
    /// Fails only at startup, after the configured connection retries are
    /// exhausted. The returned handle owns the driver task; abort it to
    /// tear the connection down.
    pub async fn connect(
        broker: &BrokerConfig,
        client_id: &str,
    ) -> Result<(Self, JoinHandle<()>), TelemetryError> {
        let (client, eventloop) = connection::establish(broker, client_id).await?;
        let driver = tokio::spawn(drive_event_loop(eventloop));
        Ok((Self { client }, driver))
    }
}

impl ReadingPublisher for MqttPublisher {
    async fn publish(&self, reading: &Reading) -> Result<(), TelemetryError> {
        let topic = topic::for_pole(reading.pole_id);
        let payload = codec::encode(reading)?;

        self.client
            .publish(topic.clone(), QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TelemetryError::transport_publish(&topic, e.to_string()))?;

        trace!(topic = %topic, seq = reading.id, "reading published");
        Ok(())
    }
}

/// Keep the rumqttc event loop turning; it owns keep-alives, QoS 1
/// acknowledgements and automatic reconnects.
async fn drive_event_loop(mut eventloop: EventLoop) {
    debug!("publisher event loop started");
    loop {
        match eventloop.poll().await {
            Ok(event) => trace!(?event, "publisher event"),
            Err(e) => {
                warn!(error = %e, "publisher connection error, reconnecting");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

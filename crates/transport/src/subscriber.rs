//! MqttSubscriber - decodes inbound messages into Readings
//!
//! Subscribes to every pole via the wildcard and forwards decoded
//! readings into an async channel. Decode failures are logged and
//! dropped; they never crash the loop.

use std::time::Duration;

use async_channel::Sender;
use contracts::{BrokerConfig, Reading, TelemetryError};
use metrics::counter;
use rumqttc::{AsyncClient, EventLoop, Packet, Publish, QoS};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{codec, connection, topic};

/// Subscriber over MQTT with QoS 1 (at-least-once).
pub struct MqttSubscriber {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttSubscriber {
    /// Connect to the broker and establish the wildcard subscription.
    ///
    /// Fails only at startup, after the configured connection retries are
    /// exhausted.
    pub async fn connect(broker: &BrokerConfig, client_id: &str) -> Result<Self, TelemetryError> {
        let (client, eventloop) = connection::establish(broker, client_id).await?;

        client
            .subscribe(topic::WILDCARD, QoS::AtLeastOnce)
            .await
            .map_err(|e| TelemetryError::TransportSubscribe {
                topic: topic::WILDCARD.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { client, eventloop })
    }

    /// Receive loop: decode each inbound message and forward it.
    ///
    /// Re-establishes the wildcard subscription on every CONNACK. There
    /// is exactly one in-process decode loop per subscriber, so
    /// reconnect-and-resubscribe never double-handles a message.
    ///
    /// Returns when the shutdown signal fires or the consumer side of
    /// the channel is closed.
    #[instrument(name = "subscriber_run", skip(self, tx, shutdown))]
    pub async fn run(mut self, tx: Sender<Reading>, mut shutdown: watch::Receiver<bool>) {
        info!(wildcard = topic::WILDCARD, "Subscriber started");

        loop {
            tokio::select! {
                event = self.eventloop.poll() => match event {
                    Ok(rumqttc::Event::Incoming(Packet::ConnAck(_))) => {
                        Self::resubscribe(&self.client).await;
                    }
                    Ok(rumqttc::Event::Incoming(Packet::Publish(publish))) => {
                        if !Self::handle_publish(publish, &tx).await {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "transport error, reconnecting");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signal received, subscriber stopping");
                        break;
                    }
                }
            }
        }

        info!("Subscriber stopped");
    }

    async fn resubscribe(client: &AsyncClient) {
        match client
            .subscribe(topic::WILDCARD, QoS::AtLeastOnce)
            .await
        {
            Ok(()) => debug!(wildcard = topic::WILDCARD, "wildcard subscription established"),
            Err(e) => warn!(error = %e, "resubscribe failed, will retry on next reconnect"),
        }
    }

    /// Decode and forward one message. Returns false when the consumer
    /// channel is closed and the loop should stop.
    async fn handle_publish(publish: Publish, tx: &Sender<Reading>) -> bool {
        match codec::decode(&publish.topic, &publish.payload) {
            Ok(reading) => {
                counter!("waterline_readings_received_total").increment(1);
                if tx.send(reading).await.is_err() {
                    warn!("reading channel closed, subscriber stopping");
                    return false;
                }
                true
            }
            Err(e) => {
                counter!("waterline_decode_failures_total").increment(1);
                warn!(topic = %publish.topic, error = %e, "dropping undecodable message");
                true
            }
        }
    }
}

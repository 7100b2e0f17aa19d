//! Broker connection establishment with bounded startup retries
//!
//! Startup is the only place a transport failure is fatal: once the
//! initial CONNACK has been seen, rumqttc's event loop reconnects on its
//! own and the callers just keep polling.

use std::time::Duration;

use contracts::{BrokerConfig, TelemetryError};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet};
use tracing::{info, warn};

/// Outstanding-request capacity for the rumqttc client channel.
const CLIENT_CAPACITY: usize = 64;

/// Connect and wait for the broker's CONNACK, retrying transient
/// failures up to `connect_retries` times.
///
/// A refused CONNACK (bad credentials, unauthorized) is not retried:
/// retrying a rejected credential only re-triggers the rejection.
pub(crate) async fn establish(
    broker: &BrokerConfig,
    client_id: &str,
) -> Result<(AsyncClient, EventLoop), TelemetryError> {
    let mut options = MqttOptions::new(client_id, &broker.host, broker.port);
    options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
    options.set_clean_session(true);
    if let (Some(user), Some(pass)) = (&broker.username, &broker.password) {
        options.set_credentials(user.clone(), pass.clone());
    }

    let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);

    let mut attempts = 0u32;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!(
                        host = %broker.host,
                        port = broker.port,
                        client_id,
                        "Connected to broker"
                    );
                    return Ok((client, eventloop));
                }
                return Err(TelemetryError::transport_connection(format!(
                    "broker {}:{} refused connection: {:?}",
                    broker.host, broker.port, ack.code
                )));
            }
            Ok(_) => {}
            Err(e) => {
                attempts += 1;
                if attempts >= broker.connect_retries {
                    return Err(TelemetryError::transport_connection(format!(
                        "unable to reach broker {}:{} after {} attempts: {e}",
                        broker.host, broker.port, attempts
                    )));
                }
                warn!(
                    attempt = attempts,
                    max = broker.connect_retries,
                    error = %e,
                    "broker connection failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(broker.connect_backoff_ms)).await;
            }
        }
    }
}

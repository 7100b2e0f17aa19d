//! # Transport
//!
//! MQTT publisher/subscriber module.
//!
//! Responsibilities:
//! - Topic convention (`sensors/<pole_id>/waterlevel`)
//! - Single wire codec boundary (structured JSON payload)
//! - QoS 1 publish, addressed per pole
//! - Wildcard subscribe with idempotent resubscription on reconnect
//!
//! The broker itself is an external collaborator; everything here talks
//! to it through `rumqttc`.

pub mod codec;
mod connection;
mod publisher;
mod subscriber;
pub mod topic;

pub use publisher::MqttPublisher;
pub use subscriber::MqttSubscriber;

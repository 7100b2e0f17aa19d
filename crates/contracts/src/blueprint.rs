//! TelemetryBlueprint - Config Loader output
//!
//! Describes a full deployment: broker, poles, simulator pacing, stores.
//! Everything here is externally supplied; nothing in the pipeline is
//! hard-coded.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{LevelBounds, PoleId};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full deployment blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// MQTT broker settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Simulator pacing and clock settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Pole definitions (fixed, known set)
    pub poles: Vec<PoleConfig>,

    /// Store routing configuration (ingest side)
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

/// MQTT broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host
    #[serde(default = "default_broker_host")]
    pub host: String,

    /// Broker port
    #[serde(default = "default_broker_port")]
    pub port: u16,

    /// Credentials (optional; brokers in the field require them)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// MQTT keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Initial connection attempts before startup is declared failed
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Backoff between initial connection attempts (milliseconds)
    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive_secs(),
            connect_retries: default_connect_retries(),
            connect_backoff_ms: default_connect_backoff_ms(),
        }
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_connect_retries() -> u32 {
    5
}

fn default_connect_backoff_ms() -> u64 {
    500
}

/// Simulator pacing, clock mode and publish retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Tick period in milliseconds (100..1000 in practice)
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// RNG seed; omit for entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Timestamp source for emitted readings
    #[serde(default)]
    pub clock: ClockMode,

    /// Publish retry policy for transient transport failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            seed: None,
            clock: ClockMode::default(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_tick_period_ms() -> u64 {
    1000
}

/// Timestamp source for emitted readings
///
/// `Live` stamps wall-clock time at emission. `Replay` advances a virtual
/// clock by a fixed step per tick, independent of emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockMode {
    Live,
    Replay {
        #[serde(with = "crate::timestamp")]
        start: NaiveDateTime,
        step_secs: u64,
    },
}

impl Default for ClockMode {
    fn default() -> Self {
        Self::Live
    }
}

/// Bounded publish retry with doubling backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per reading (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff (milliseconds), doubled per attempt
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

/// One pole's physical range and signal shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoleConfig {
    /// Externally assigned identifier
    pub id: PoleId,

    /// Lower physical bound (meters)
    pub min_level: f64,

    /// Upper physical bound (meters)
    pub max_level: f64,

    /// Starting level; defaults to the midpoint of the range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_level: Option<f64>,

    /// Trend resampled uniformly from `[-trend_range, trend_range]`
    #[serde(default = "default_trend_range")]
    pub trend_range: f64,

    /// Noise drawn uniformly from `[-noise_amplitude, noise_amplitude]`
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,

    /// Per-tick probability of resampling the trend
    #[serde(default = "default_flip_probability")]
    pub flip_probability: f64,
}

impl PoleConfig {
    /// Physical range as bounds
    pub fn bounds(&self) -> LevelBounds {
        LevelBounds::new(self.min_level, self.max_level)
    }

    /// Starting level, falling back to the range midpoint
    pub fn starting_level(&self) -> f64 {
        self.initial_level.unwrap_or_else(|| self.bounds().midpoint())
    }
}

fn default_trend_range() -> f64 {
    0.2
}

fn default_noise_amplitude() -> f64 {
    0.05
}

fn default_flip_probability() -> f64 {
    0.1
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Unique store name (used for logging/metrics)
    pub name: String,

    /// Store implementation
    pub store_type: StoreType,

    /// Worker queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Store-specific parameters (e.g. `path`)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Store implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Atomic-replace JSON snapshot file
    Json,
    /// SQLite table keyed by reading id
    Sqlite,
    /// Log each reading via tracing (debug aid)
    Log,
}

fn default_queue_capacity() -> usize {
    100
}

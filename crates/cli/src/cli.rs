//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Waterline - water-level telemetry pipeline
#[derive(Parser, Debug)]
#[command(
    name = "waterline",
    author,
    version,
    about = "Water-level telemetry: simulator, MQTT transport, durable ingestion",
    long_about = "A water-level telemetry pipeline.\n\n\
                  The `simulate` command generates bounded, drifting sensor readings \n\
                  and publishes them per pole over MQTT; the `ingest` command \n\
                  subscribes to all poles and persists each reading exactly once \n\
                  into the configured stores."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "WATERLINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "WATERLINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the telemetry simulator (producer side)
    Simulate(SimulateArgs),

    /// Run the subscriber + ingest writer (consumer side)
    Ingest(IngestArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "WATERLINE_CONFIG")]
    pub config: PathBuf,

    /// Override broker host from configuration
    #[arg(long, env = "WATERLINE_BROKER_HOST")]
    pub host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "WATERLINE_BROKER_PORT")]
    pub port: Option<u16>,

    /// Override tick period in milliseconds from configuration
    #[arg(long, env = "WATERLINE_TICK_MS")]
    pub tick_ms: Option<u64>,

    /// Maximum number of ticks to run (0 = unlimited)
    #[arg(long, default_value = "0", env = "WATERLINE_MAX_TICKS")]
    pub max_ticks: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "WATERLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `ingest` command
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "WATERLINE_CONFIG")]
    pub config: PathBuf,

    /// Override broker host from configuration
    #[arg(long, env = "WATERLINE_BROKER_HOST")]
    pub host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "WATERLINE_BROKER_PORT")]
    pub port: Option<u16>,

    /// Maximum number of readings to ingest (0 = unlimited)
    #[arg(long, default_value = "0", env = "WATERLINE_MAX_READINGS")]
    pub max_readings: u64,

    /// Channel buffer size for internal queues
    #[arg(long, default_value = "100", env = "WATERLINE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9001", env = "WATERLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed pole information
    #[arg(long)]
    pub poles: bool,

    /// Show store configuration
    #[arg(long)]
    pub stores: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

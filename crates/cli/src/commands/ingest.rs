//! `ingest` command implementation.
//!
//! Wires MqttSubscriber -> metrics relay -> Ingestor. The relay loop sits
//! between the transport and the stores so per-pole statistics and
//! Prometheus counters see every reading exactly where it is accepted.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ingestion::create_ingestor;
use observability::LevelAggregator;
use tracing::{info, warn};
use transport::MqttSubscriber;

use crate::cli::IngestArgs;
use crate::stats::IngestReport;

/// Execute the `ingest` command
pub async fn run_ingest(args: &IngestArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding broker host from CLI");
        blueprint.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding broker port from CLI");
        blueprint.broker.port = port;
    }

    if blueprint.stores.is_empty() {
        warn!("No stores configured - readings will be dropped");
    }

    info!(
        host = %blueprint.broker.host,
        port = blueprint.broker.port,
        poles = blueprint.poles.len(),
        stores = blueprint.stores.len(),
        "Configuration loaded"
    );

    // Initialize metrics (optional)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    // Stores first: a store that cannot be created is a startup failure.
    let (ingest_tx, ingest_rx) = async_channel::bounded(args.buffer_size);
    let ingestor = create_ingestor(blueprint.stores.clone(), &blueprint.poles, ingest_rx)
        .context("Failed to create ingestor")?;
    let ingestor_handle = ingestor.spawn();

    info!(stores = blueprint.stores.len(), "Ingestor started");

    // Then the transport; startup is the only fatal place for transport
    // failures.
    let client_id = format!("waterline-ingest-{}", std::process::id());
    let subscriber = MqttSubscriber::connect(&blueprint.broker, &client_id)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to broker at {}:{}",
                blueprint.broker.host, blueprint.broker.port
            )
        })?;

    let (raw_tx, raw_rx) = async_channel::bounded(args.buffer_size);

    // Setup graceful shutdown handler
    let shutdown_rx = super::spawn_shutdown_signal();
    let subscriber_handle = tokio::spawn(subscriber.run(raw_tx, shutdown_rx));

    let max_readings = if args.max_readings == 0 {
        None
    } else {
        Some(args.max_readings)
    };

    info!(max_readings = ?max_readings, "Pipeline running");
    let start_time = Instant::now();

    // Relay loop: transport -> metrics -> stores
    let mut aggregator = LevelAggregator::new();
    let mut received: u64 = 0;

    while let Ok(reading) = raw_rx.recv().await {
        received += 1;
        observability::record_reading_received(reading.pole_id);
        aggregator.update(&reading);

        if ingest_tx.send(reading).await.is_err() {
            warn!("Ingestor channel closed");
            break;
        }

        if let Some(max) = max_readings {
            if received >= max {
                info!(readings = received, "Reached max readings limit");
                break;
            }
        }
    }

    // Shutdown: stop the subscriber, then drain the stores.
    info!("Shutting down pipeline...");
    subscriber_handle.abort();
    let _ = tokio::time::timeout(Duration::from_secs(5), subscriber_handle).await;

    drop(ingest_tx);
    let store_stats = tokio::time::timeout(Duration::from_secs(10), ingestor_handle)
        .await
        .context("Timed out waiting for stores to flush")?
        .context("Ingestor task failed")?;

    let report = IngestReport {
        received,
        stores: store_stats,
        levels: aggregator.summary(),
        duration: start_time.elapsed(),
    };

    info!(
        readings = report.received,
        duration_secs = report.duration.as_secs_f64(),
        "Ingest completed"
    );

    report.print_summary();

    info!("Waterline ingest finished");
    Ok(())
}

//! `simulate` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use simulator::Simulator;
use tracing::info;
use transport::MqttPublisher;

use crate::cli::SimulateArgs;
use crate::stats::SimulateReport;

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
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
    if let Some(tick_ms) = args.tick_ms {
        info!(tick_ms, "Overriding tick period from CLI");
        blueprint.simulator.tick_period_ms = tick_ms;
    }

    info!(
        host = %blueprint.broker.host,
        port = blueprint.broker.port,
        poles = blueprint.poles.len(),
        tick_ms = blueprint.simulator.tick_period_ms,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Initialize metrics (optional)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    // Connect to the broker; startup is the only fatal place for
    // transport failures.
    let client_id = format!("waterline-sim-{}", std::process::id());
    let (publisher, driver) = MqttPublisher::connect(&blueprint.broker, &client_id)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to broker at {}:{}",
                blueprint.broker.host, blueprint.broker.port
            )
        })?;

    let max_ticks = if args.max_ticks == 0 {
        None
    } else {
        Some(args.max_ticks)
    };

    let sim = Simulator::from_blueprint(&blueprint, publisher).with_max_ticks(max_ticks);

    // Setup graceful shutdown handler
    let shutdown_rx = super::spawn_shutdown_signal();

    info!("Starting simulator...");
    let start_time = Instant::now();

    let stats = sim.run(shutdown_rx).await;

    // Tear down the broker connection
    driver.abort();

    let report = SimulateReport {
        simulator: stats,
        duration: start_time.elapsed(),
        poles: blueprint.poles.len(),
    };

    info!(
        ticks = report.simulator.ticks,
        published = report.simulator.published,
        delivery_failures = report.simulator.delivery_failures,
        duration_secs = report.duration.as_secs_f64(),
        "Simulator completed"
    );

    report.print_summary();

    info!("Waterline simulate finished");
    Ok(())
}

fn print_config_summary(blueprint: &contracts::TelemetryBlueprint) {
    println!("Configuration summary:");
    println!("  Broker: {}:{}", blueprint.broker.host, blueprint.broker.port);
    println!("  Tick period: {}ms", blueprint.simulator.tick_period_ms);
    println!("  Clock: {:?}", blueprint.simulator.clock);
    println!("  Poles: {}", blueprint.poles.len());
    for pole in &blueprint.poles {
        println!(
            "    Pole {}: range [{}, {}], start {}",
            pole.id,
            pole.min_level,
            pole.max_level,
            pole.starting_level()
        );
    }
}

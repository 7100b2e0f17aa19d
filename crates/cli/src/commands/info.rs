//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    simulator: SimulatorInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    poles: Vec<PoleInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stores: Vec<StoreInfo>,
}

#[derive(Serialize)]
struct BrokerInfo {
    host: String,
    port: u16,
    authenticated: bool,
}

#[derive(Serialize)]
struct SimulatorInfo {
    tick_period_ms: u64,
    clock: String,
}

#[derive(Serialize)]
struct PoleInfo {
    id: u16,
    min_level: f64,
    max_level: f64,
    initial_level: f64,
    trend_range: f64,
    noise_amplitude: f64,
    flip_probability: f64,
}

#[derive(Serialize)]
struct StoreInfo {
    name: String,
    store_type: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::TelemetryBlueprint, args: &InfoArgs) -> ConfigInfo {
    let poles = if args.poles {
        blueprint
            .poles
            .iter()
            .map(|p| PoleInfo {
                id: p.id.get(),
                min_level: p.min_level,
                max_level: p.max_level,
                initial_level: p.starting_level(),
                trend_range: p.trend_range,
                noise_amplitude: p.noise_amplitude,
                flip_probability: p.flip_probability,
            })
            .collect()
    } else {
        Vec::new()
    };

    let stores = if args.stores {
        blueprint
            .stores
            .iter()
            .map(|s| StoreInfo {
                name: s.name.clone(),
                store_type: format!("{:?}", s.store_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        broker: BrokerInfo {
            host: blueprint.broker.host.clone(),
            port: blueprint.broker.port,
            authenticated: blueprint.broker.username.is_some(),
        },
        simulator: SimulatorInfo {
            tick_period_ms: blueprint.simulator.tick_period_ms,
            clock: format!("{:?}", blueprint.simulator.clock),
        },
        poles,
        stores,
    }
}

fn print_config_info(blueprint: &contracts::TelemetryBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Waterline Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Broker info
    println!("📡 Broker");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Address: {}:{}",
        blueprint.broker.host, blueprint.broker.port
    );
    match &blueprint.broker.username {
        Some(user) => println!("   └─ Credentials: {user} (password configured)"),
        None => println!("   └─ Credentials: anonymous"),
    }

    // Simulator
    println!("\n⏱  Simulator");
    println!("   ├─ Tick period: {}ms", blueprint.simulator.tick_period_ms);
    println!("   └─ Clock: {:?}", blueprint.simulator.clock);

    // Poles
    println!("\n📏 Poles ({})", blueprint.poles.len());
    for (i, pole) in blueprint.poles.iter().enumerate() {
        let is_last = i == blueprint.poles.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };

        if args.poles {
            println!(
                "   {} Pole {} [{}, {}] start={} trend±{} noise±{} flip={}",
                prefix,
                pole.id,
                pole.min_level,
                pole.max_level,
                pole.starting_level(),
                pole.trend_range,
                pole.noise_amplitude,
                pole.flip_probability
            );
        } else {
            println!(
                "   {} Pole {} [{}, {}]",
                prefix, pole.id, pole.min_level, pole.max_level
            );
        }
    }

    // Stores
    if !blueprint.stores.is_empty() {
        println!("\n💾 Stores ({})", blueprint.stores.len());
        for (i, store) in blueprint.stores.iter().enumerate() {
            let is_last = i == blueprint.stores.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.stores {
                println!(
                    "   {} {} ({:?}) {:?}",
                    prefix, store.name, store.store_type, store.params
                );
            } else {
                println!("   {} {} ({:?})", prefix, store.name, store.store_type);
            }
        }
    }

    println!();
}

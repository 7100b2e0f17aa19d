//! Simulator - periodic reading generation for all configured poles
//!
//! Owns one `TrendState` per pole and a tick clock. Every tick, poles are
//! stepped in configuration order, stamped from the shared clock, and
//! handed to the publisher. The sequence counter belongs to the instance,
//! so independent simulators never collide.

use std::time::Duration;

use contracts::{
    PoleConfig, PoleId, Reading, ReadingPublisher, RetryConfig, SimulatorConfig, TelemetryBlueprint,
};
use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace, warn};

use crate::clock::TickClock;
use crate::signal::{SignalModel, TrendState};

/// Counters for one simulator run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorStats {
    /// Ticks executed
    pub ticks: u64,
    /// Readings acknowledged by the transport
    pub published: u64,
    /// Publish retries that eventually succeeded or failed
    pub retries: u64,
    /// Readings dropped after exhausting retries
    pub delivery_failures: u64,
}

struct PoleRuntime {
    id: PoleId,
    model: SignalModel,
    state: TrendState,
}

/// Drives one `SignalModel` per pole on a fixed tick.
pub struct Simulator<P> {
    publisher: P,
    poles: Vec<PoleRuntime>,
    tick_period: Duration,
    retry: RetryConfig,
    clock: TickClock,
    max_ticks: Option<u64>,
    next_seq: u64,
    tick_index: u64,
    rng: StdRng,
    stats: SimulatorStats,
}

impl<P: ReadingPublisher> Simulator<P> {
    /// Build a simulator from pole definitions and pacing config.
    pub fn new(poles: &[PoleConfig], config: &SimulatorConfig, publisher: P) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let poles = poles
            .iter()
            .map(|pole| {
                let model = SignalModel::from_config(pole);
                let trend = model.initial_trend(&mut rng);
                PoleRuntime {
                    id: pole.id,
                    model,
                    state: TrendState::new(pole.starting_level(), trend),
                }
            })
            .collect();

        Self {
            publisher,
            poles,
            tick_period: Duration::from_millis(config.tick_period_ms),
            retry: config.retry.clone(),
            clock: TickClock::new(config.clock.clone()),
            max_ticks: None,
            next_seq: 0,
            tick_index: 0,
            rng,
            stats: SimulatorStats::default(),
        }
    }

    /// Convenience constructor from a full blueprint.
    pub fn from_blueprint(blueprint: &TelemetryBlueprint, publisher: P) -> Self {
        Self::new(&blueprint.poles, &blueprint.simulator, publisher)
    }

    /// Stop after `n` ticks (None = run until shutdown).
    pub fn with_max_ticks(mut self, n: Option<u64>) -> Self {
        self.max_ticks = n;
        self
    }

    /// Run the tick loop until shutdown or the tick limit.
    ///
    /// A tick in flight always completes before the loop observes the
    /// shutdown signal; missed tick deadlines are skipped, never queued.
    #[instrument(name = "simulator_run", skip(self, shutdown), fields(poles = self.poles.len()))]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SimulatorStats {
        info!(
            poles = self.poles.len(),
            tick_ms = self.tick_period.as_millis() as u64,
            "Simulator started"
        );

        let mut interval = tokio::time::interval(self.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once().await;

                    if self.stats.ticks.is_multiple_of(100) {
                        debug!(ticks = self.stats.ticks, "Simulator progress");
                    }

                    if let Some(max) = self.max_ticks {
                        if self.stats.ticks >= max {
                            info!(ticks = self.stats.ticks, "Reached tick limit");
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) if !*shutdown.borrow() => continue,
                        _ => {
                            info!("Shutdown signal received, stopping after current tick");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            ticks = self.stats.ticks,
            published = self.stats.published,
            delivery_failures = self.stats.delivery_failures,
            "Simulator stopped"
        );

        self.stats
    }

    /// Step every pole once and publish the resulting readings.
    async fn tick_once(&mut self) {
        self.tick_index += 1;
        self.stats.ticks += 1;
        let observed_at = self.clock.next();

        for idx in 0..self.poles.len() {
            let pole = &mut self.poles[idx];
            let level = pole
                .model
                .step(&mut pole.state, self.tick_index, &mut self.rng);

            self.next_seq += 1;
            let reading = Reading {
                id: self.next_seq,
                pole_id: pole.id,
                water_level: level,
                observed_at,
            };

            trace!(
                pole_id = %reading.pole_id,
                seq = reading.id,
                level = reading.water_level,
                "reading emitted"
            );

            self.publish_with_retry(&reading).await;
        }
    }

    /// Publish one reading, retrying transient failures a bounded number
    /// of times with doubling backoff. On exhaustion the reading is
    /// dropped and a delivery-failed event is logged; the tick loop is
    /// never blocked indefinitely by one reading.
    async fn publish_with_retry(&mut self, reading: &Reading) {
        let mut backoff = Duration::from_millis(self.retry.backoff_ms);

        for attempt in 1..=self.retry.max_attempts {
            match self.publisher.publish(reading).await {
                Ok(()) => {
                    self.stats.published += 1;
                    counter!("waterline_readings_published_total").increment(1);
                    return;
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    self.stats.retries += 1;
                    counter!("waterline_publish_retries_total").increment(1);
                    warn!(
                        pole_id = %reading.pole_id,
                        seq = reading.id,
                        attempt,
                        error = %e,
                        "publish failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    self.stats.delivery_failures += 1;
                    counter!("waterline_delivery_failures_total").increment(1);
                    warn!(
                        pole_id = %reading.pole_id,
                        seq = reading.id,
                        attempts = self.retry.max_attempts,
                        error = %e,
                        "delivery failed, dropping reading"
                    );
                    return;
                }
            }
        }
    }
}

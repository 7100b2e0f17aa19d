//! Pipeline metric recording and in-memory level statistics
//!
//! The `record_*` helpers feed the Prometheus exporter; `LevelAggregator`
//! keeps per-pole statistics in memory for the end-of-run summary.

use contracts::PoleId;
use metrics::{counter, gauge};
use std::collections::BTreeMap;

/// Record a reading accepted from the transport
pub fn record_reading_received(pole_id: PoleId) {
    counter!(
        "waterline_pole_readings_received_total",
        "pole_id" => pole_id.to_string()
    )
    .increment(1);
}

/// Record the current level of a pole
pub fn record_pole_level(pole_id: PoleId, level: f64) {
    gauge!(
        "waterline_pole_level",
        "pole_id" => pole_id.to_string()
    )
    .set(level);
}

/// Record an out-of-order arrival (observed_at went backwards for a pole)
pub fn record_out_of_order(pole_id: PoleId) {
    counter!(
        "waterline_readings_out_of_order_total",
        "pole_id" => pole_id.to_string()
    )
    .increment(1);
}

/// Per-pole level statistics for the end-of-run summary.
///
/// BTreeMap keeps the summary output in pole order.
#[derive(Debug, Clone, Default)]
pub struct LevelAggregator {
    per_pole: BTreeMap<PoleId, RunningStats>,
    last_observed: BTreeMap<PoleId, contracts::Reading>,
    /// Arrivals whose observed_at went backwards for their pole
    pub out_of_order: u64,
}

impl LevelAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update statistics with one reading
    pub fn update(&mut self, reading: &contracts::Reading) {
        self.per_pole
            .entry(reading.pole_id)
            .or_default()
            .push(reading.water_level);

        if let Some(last) = self.last_observed.get(&reading.pole_id) {
            if reading.observed_at < last.observed_at {
                self.out_of_order += 1;
                record_out_of_order(reading.pole_id);
            }
        }
        self.last_observed.insert(reading.pole_id, reading.clone());

        record_pole_level(reading.pole_id, reading.water_level);
    }

    /// Generate the summary report
    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            per_pole: self
                .per_pole
                .iter()
                .map(|(id, stats)| (*id, StatsSummary::from(stats)))
                .collect(),
            out_of_order: self.out_of_order,
        }
    }
}

/// Summary of per-pole level statistics
#[derive(Debug, Clone, Default)]
pub struct LevelSummary {
    pub per_pole: BTreeMap<PoleId, StatsSummary>,
    pub out_of_order: u64,
}

impl std::fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Level Summary ===")?;
        for (pole_id, stats) in &self.per_pole {
            writeln!(f, "Pole {pole_id}: {stats}")?;
        }
        writeln!(f, "Out-of-order arrivals: {}", self.out_of_order)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

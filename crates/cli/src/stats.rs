//! Run statistics printed at shutdown.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::LevelSummary;
use simulator::SimulatorStats;

/// Statistics from a `simulate` run
#[derive(Debug, Clone, Default)]
pub struct SimulateReport {
    /// Simulator counters
    pub simulator: SimulatorStats,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of configured poles
    pub poles: usize,
}

impl SimulateReport {
    /// Readings published per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.simulator.published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Simulate Summary ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Poles: {}", self.poles);
        println!("Ticks: {}", self.simulator.ticks);
        println!("Readings published: {}", self.simulator.published);
        println!("Publish retries: {}", self.simulator.retries);
        println!("Delivery failures: {}", self.simulator.delivery_failures);
        println!("Throughput: {:.2} readings/s", self.throughput());
    }
}

/// Statistics from an `ingest` run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Readings received from the transport
    pub received: u64,

    /// Per-store write counters at shutdown
    pub stores: Vec<(String, MetricsSnapshot)>,

    /// Per-pole level statistics
    pub levels: LevelSummary,

    /// Total duration of the run
    pub duration: Duration,
}

impl IngestReport {
    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Ingest Summary ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Readings received: {}", self.received);

        for (name, snapshot) in &self.stores {
            println!(
                "Store '{}': inserted={}, duplicates={}, failures={}, dropped={}",
                name,
                snapshot.insert_count,
                snapshot.duplicate_count,
                snapshot.failure_count,
                snapshot.dropped_count
            );
        }

        print!("{}", self.levels);
    }
}

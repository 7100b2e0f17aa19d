//! # Simulator
//!
//! Continuous telemetry generation module.
//!
//! Responsibilities:
//! - One bounded, drifting `SignalModel` per pole (no I/O)
//! - Fixed-cadence tick loop with live/replay timestamp modes
//! - Per-instance sequence numbering
//! - Bounded publish retry, drop-and-log on exhaustion
//!
//! ## Usage Example
//!
//! ```ignore
//! use simulator::Simulator;
//! use tokio::sync::watch;
//!
//! let simulator = Simulator::from_blueprint(&blueprint, publisher);
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let stats = simulator.run(shutdown_rx).await;
//! println!("published {}", stats.published);
//! ```

mod clock;
mod signal;
mod simulator;

pub use clock::TickClock;
pub use signal::{round2, SignalModel, TrendState, BOUND_EPSILON};
pub use simulator::{Simulator, SimulatorStats};

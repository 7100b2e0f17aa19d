//! Signal model - bounded drifting water level for one pole
//!
//! Pure state transition, no I/O. Per tick, in this order:
//! 1. with `flip_probability`, resample the trend from the configured range
//! 2. step: `level + trend + uniform noise`
//! 3. bounce check on the unrounded value (trend negated at a bound)
//! 4. clamp into `[min, max]`
//!
//! The emitted level is rounded to 2 decimal digits; the internal state
//! keeps the unrounded value so rounding never feeds back into the signal.

use contracts::{LevelBounds, PoleConfig};
use rand::Rng;

/// How close (in level units) the unrounded value must get to a bound
/// before an outward trend is negated.
pub const BOUND_EPSILON: f64 = 1e-6;

/// Per-pole mutable state, owned exclusively by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendState {
    /// Current unrounded level
    pub level: f64,
    /// Signed per-tick drift rate
    pub trend: f64,
    /// Tick index of the last trend change (resample or bounce)
    pub last_flip_tick: u64,
}

impl TrendState {
    pub fn new(level: f64, trend: f64) -> Self {
        Self {
            level,
            trend,
            last_flip_tick: 0,
        }
    }
}

/// Signal shape parameters for one pole.
#[derive(Debug, Clone, Copy)]
pub struct SignalModel {
    bounds: LevelBounds,
    trend_range: f64,
    noise_amplitude: f64,
    flip_probability: f64,
}

impl SignalModel {
    pub fn new(
        bounds: LevelBounds,
        trend_range: f64,
        noise_amplitude: f64,
        flip_probability: f64,
    ) -> Self {
        Self {
            bounds,
            trend_range,
            noise_amplitude,
            flip_probability,
        }
    }

    /// Build from a pole's configuration.
    pub fn from_config(config: &PoleConfig) -> Self {
        Self::new(
            config.bounds(),
            config.trend_range,
            config.noise_amplitude,
            config.flip_probability,
        )
    }

    pub fn bounds(&self) -> LevelBounds {
        self.bounds
    }

    /// Draw an initial trend from the configured range.
    pub fn initial_trend<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(-self.trend_range..=self.trend_range)
    }

    /// Advance the state by one tick and return the rounded level to emit.
    pub fn step<R: Rng>(&self, state: &mut TrendState, tick: u64, rng: &mut R) -> f64 {
        // Drift changes are checked before the bounce rule in the same tick.
        if self.flip_probability > 0.0 && rng.gen::<f64>() < self.flip_probability {
            state.trend = rng.gen_range(-self.trend_range..=self.trend_range);
            state.last_flip_tick = tick;
        }

        let noise = if self.noise_amplitude > 0.0 {
            rng.gen_range(-self.noise_amplitude..=self.noise_amplitude)
        } else {
            0.0
        };

        let raw = state.level + state.trend + noise;

        // Bounce on the unrounded value: negate an outward trend near a
        // bound so the signal oscillates instead of flat-lining.
        if raw >= self.bounds.max - BOUND_EPSILON && state.trend > 0.0 {
            state.trend = -state.trend;
            state.last_flip_tick = tick;
        } else if raw <= self.bounds.min + BOUND_EPSILON && state.trend < 0.0 {
            state.trend = -state.trend;
            state.last_flip_tick = tick;
        }

        state.level = self.bounds.clamp(raw);
        round2(state.level)
    }
}

/// Round to 2 decimal digits (emitted precision).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

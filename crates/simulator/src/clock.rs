//! Tick clock - live and replay timestamp sources
//!
//! Live mode stamps wall-clock time at emission; replay mode advances a
//! virtual clock by a fixed step per tick. Either way, timestamps are
//! second precision and non-decreasing.

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use contracts::ClockMode;

/// Timestamp source for the simulator's tick loop.
#[derive(Debug, Clone)]
pub enum TickClock {
    /// Wall clock at emission, guarded against backwards steps
    Live { last: Option<NaiveDateTime> },
    /// Virtual clock advancing by a fixed step per tick
    Replay {
        next: NaiveDateTime,
        step: Duration,
    },
}

impl TickClock {
    pub fn new(mode: ClockMode) -> Self {
        match mode {
            ClockMode::Live => Self::Live { last: None },
            ClockMode::Replay { start, step_secs } => Self::Replay {
                next: start,
                step: Duration::seconds(step_secs as i64),
            },
        }
    }

    /// Timestamp for the current tick, shared by every pole in the tick.
    pub fn next(&mut self) -> NaiveDateTime {
        match self {
            Self::Live { last } => {
                let now = truncate_to_seconds(Local::now().naive_local());
                // Wall clock can step backwards; readings never do.
                let stamped = match *last {
                    Some(prev) if now < prev => prev,
                    _ => now,
                };
                *last = Some(stamped);
                stamped
            }
            Self::Replay { next, step } => {
                let current = *next;
                *next = current + *step;
                current
            }
        }
    }
}

fn truncate_to_seconds(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

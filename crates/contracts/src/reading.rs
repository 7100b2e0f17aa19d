//! Reading - one timestamped water-level observation
//!
//! Canonical schema used on the wire and in every store:
//! `{id, pole_id, water_level, observed_at}`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{PoleId, TelemetryError};

/// Pinned timestamp format: ISO-8601 local time without offset.
///
/// Second precision, no fraction, no timezone (`2025-11-29T10:00:00`).
/// This module is the only place the format string lives; serde fields
/// use it via `#[serde(with = "contracts::timestamp")]`.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One water-level observation from one pole.
///
/// Immutable once produced. `id` is unique per run and monotonically
/// increasing at the producer; `observed_at` is non-decreasing per pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Producer-assigned sequence number, unique per run
    pub id: u64,

    /// Pole that produced the observation
    pub pole_id: PoleId,

    /// Water level, rounded to 2 decimal digits at the producer
    pub water_level: f64,

    /// Local wall-clock or replay-clock time of the observation
    #[serde(with = "timestamp")]
    pub observed_at: NaiveDateTime,
}

impl Reading {
    /// Check the reading against a pole's physical range.
    ///
    /// A reading outside `[min, max]` is invalid and must be rejected by
    /// consumers, never passed through.
    pub fn validate(&self, bounds: &LevelBounds) -> Result<(), TelemetryError> {
        if bounds.contains(self.water_level) {
            Ok(())
        } else {
            Err(TelemetryError::OutOfRange {
                pole_id: self.pole_id,
                level: self.water_level,
                min: bounds.min,
                max: bounds.max,
            })
        }
    }
}

/// Physical range of a pole's water level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds {
    pub min: f64,
    pub max: f64,
}

impl LevelBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range, used as the default starting level.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Full span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn contains(&self, level: f64) -> bool {
        level >= self.min && level <= self.max
    }

    #[inline]
    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

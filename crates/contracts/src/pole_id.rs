//! PoleId - Copyable pole identifier
//!
//! Small positive integer assigned externally to a physical measurement pole.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a measurement pole.
///
/// Wraps a non-zero `u16`. Pole ids are assigned externally, form a small
/// fixed set, and are never reused across poles, so the type is `Copy` and
/// orders naturally.
///
/// # Examples
/// ```
/// use contracts::PoleId;
///
/// let id = PoleId::new(1).unwrap();
/// assert_eq!(id.get(), 1);
/// assert_eq!(id.to_string(), "1");
/// assert!(PoleId::new(0).is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoleId(u16);

impl PoleId {
    /// Create a new PoleId. Returns `None` for zero.
    #[inline]
    pub const fn new(raw: u16) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Get the underlying integer.
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for PoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoleId({})", self.0)
    }
}

/// Error parsing a PoleId from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePoleIdError {
    /// Not a decimal integer in `u16` range
    Invalid(ParseIntError),
    /// Parsed to zero, which is not a valid pole id
    Zero,
}

impl fmt::Display for ParsePoleIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "invalid pole id: {e}"),
            Self::Zero => write!(f, "pole id must be a positive integer"),
        }
    }
}

impl std::error::Error for ParsePoleIdError {}

impl FromStr for PoleId {
    type Err = ParsePoleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u16 = s.parse().map_err(ParsePoleIdError::Invalid)?;
        Self::new(raw).ok_or(ParsePoleIdError::Zero)
    }
}

impl Serialize for PoleId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for PoleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u16::deserialize(deserializer)?;
        Self::new(raw).ok_or_else(|| serde::de::Error::custom("pole id must be a positive integer"))
    }
}

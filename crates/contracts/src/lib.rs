//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `observed_at` is local wall-clock time without offset, second precision
//! - Serialized everywhere as `%Y-%m-%dT%H:%M:%S` (see [`timestamp`])

mod blueprint;
mod error;
mod pole_id;
mod publisher;
mod reading;
mod store;

pub use blueprint::*;
pub use error::*;
pub use pole_id::{ParsePoleIdError, PoleId};
pub use publisher::ReadingPublisher;
pub use reading::{timestamp, LevelBounds, Reading};
pub use store::{StoreWriter, WriteOutcome};

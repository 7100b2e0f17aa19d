//! Store implementations

mod json_file;
mod log;
mod sqlite;

pub use json_file::{JsonSnapshotConfig, JsonSnapshotStore};
pub use log::LogStore;
pub use sqlite::SqliteStore;

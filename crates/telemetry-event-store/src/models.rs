//! Model types for the event store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An event that failed delivery and is waiting to be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    /// Unique event identifier (primary key).
    pub event_id: String,
    /// Serialized event body, opaque to the store.
    pub payload: String,
}

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A SQLite file; parent directories are created on open.
    File(PathBuf),
    /// A private in-memory database, lost when the store is dropped.
    InMemory,
}

impl StoreLocation {
    /// Human-readable form for logs.
    pub fn display(&self) -> String {
        match self {
            StoreLocation::File(path) => path.to_string_lossy().to_string(),
            StoreLocation::InMemory => ":memory:".to_string(),
        }
    }
}

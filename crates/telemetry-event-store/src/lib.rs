//! Durable storage for telemetry events that could not be delivered.
//!
//! This crate provides:
//! - `EventStore`: the insert/query/delete contract the transport relies on
//! - `SqliteEventStore`: the SQLite implementation, opened lazily
//! - `AsyncDatabase`: async executor running SQLite on a dedicated thread
//!
//! # Example
//!
//! ```ignore
//! let store = SqliteEventStore::new(StoreLocation::File(path));
//! store.insert("evt-1", r#"{"message":"boom"}"#).await?;
//! let batch = store.query_batch(DEFAULT_BATCH_LIMIT).await?;
//! ```

mod error;
mod executor;
mod models;
pub mod queries;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use executor::AsyncDatabase;
pub use models::{PendingEvent, StoreLocation};
pub use schema::ensure_schema;
pub use store::{EventStore, SqliteEventStore, StoreHandle, DEFAULT_BATCH_LIMIT};

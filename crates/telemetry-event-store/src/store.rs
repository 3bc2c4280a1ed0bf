//! The event store contract and its SQLite implementation.

use crate::{queries, AsyncDatabase, PendingEvent, StoreLocation, StoreResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Default number of events returned by one batch read.
pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// Durable storage for events awaiting delivery, keyed by event id.
///
/// Every method is a single atomic operation. No call holds locks or rows
/// across calls, so implementations must be safe to use concurrently.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Acquire the storage handle, creating the schema if needed.
    async fn ensure_ready(&self) -> StoreResult<()>;

    /// Persist an event. Storing an id that already exists replaces its payload.
    async fn insert(&self, event_id: &str, payload: &str) -> StoreResult<()>;

    /// Read up to `limit` events, oldest first, without removing them.
    async fn query_batch(&self, limit: usize) -> StoreResult<Vec<PendingEvent>>;

    /// Remove an event. Returns false when nothing was stored under `event_id`.
    async fn delete(&self, event_id: &str) -> StoreResult<bool>;

    /// Number of stored events.
    async fn count(&self) -> StoreResult<usize>;
}

/// Thread-safe handle to an event store.
pub type StoreHandle = Arc<dyn EventStore>;

/// SQLite-backed [`EventStore`].
///
/// The database is opened on first use and the handle reused afterwards. A
/// failed open is not remembered, so the next call tries again.
pub struct SqliteEventStore {
    location: StoreLocation,
    db: OnceCell<AsyncDatabase>,
}

impl SqliteEventStore {
    /// Create a store for `location` without touching storage yet.
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            db: OnceCell::new(),
        }
    }

    /// Create a store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(StoreLocation::InMemory)
    }

    async fn database(&self) -> StoreResult<&AsyncDatabase> {
        let result = self
            .db
            .get_or_try_init(|| AsyncDatabase::open(&self.location))
            .await;
        if let Err(e) = &result {
            warn!(location = %self.location.display(), error = %e, "Event store unavailable");
        }
        result
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn ensure_ready(&self) -> StoreResult<()> {
        self.database().await?;
        Ok(())
    }

    async fn insert(&self, event_id: &str, payload: &str) -> StoreResult<()> {
        let event_id = event_id.to_string();
        let payload = payload.to_string();
        self.database()
            .await?
            .call_sqlite(move |conn| queries::upsert_event(conn, &event_id, &payload))
            .await
    }

    async fn query_batch(&self, limit: usize) -> StoreResult<Vec<PendingEvent>> {
        let events = self
            .database()
            .await?
            .call_sqlite(move |conn| queries::list_events(conn, limit))
            .await?;
        debug!(count = events.len(), limit, "Read pending batch");
        Ok(events)
    }

    async fn delete(&self, event_id: &str) -> StoreResult<bool> {
        let event_id = event_id.to_string();
        self.database()
            .await?
            .call_sqlite(move |conn| queries::delete_event(conn, &event_id))
            .await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.database()
            .await?
            .call_sqlite(queries::count_events)
            .await
    }
}

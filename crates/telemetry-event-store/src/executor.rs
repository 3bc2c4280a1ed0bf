//! Async SQLite executor using a dedicated background thread.
//!
//! All statements go through one `tokio_rusqlite::Connection`, whose worker
//! thread runs them in FIFO order. That thread is the single writer for the
//! store, so inserts and deletes never contend for the SQLite write lock
//! within one process.
//!
//! Only SQL belongs inside `call()`. Payload parsing and network calls happen
//! outside it.

use crate::{schema, StoreError, StoreLocation, StoreResult};
use tokio_rusqlite::Connection;
use tracing::info;

/// Convert a tokio_rusqlite::Error to StoreError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> StoreError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => StoreError::Connection("Connection closed".to_string()),
        other => StoreError::Connection(other.to_string()),
    }
}

/// Async SQLite database with a dedicated executor thread.
#[derive(Clone)]
pub struct AsyncDatabase {
    conn: Connection,
}

impl AsyncDatabase {
    /// Open the database at `location`.
    ///
    /// This will:
    /// - Create parent directories for file databases
    /// - Enable WAL mode and a busy timeout
    /// - Create the `events` table if absent
    pub async fn open(location: &StoreLocation) -> StoreResult<Self> {
        let shown = location.display();
        info!(location = %shown, "Opening event store");

        let conn = match location {
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path.clone()).await
            }
            StoreLocation::InMemory => Connection::open_in_memory().await,
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            schema::ensure_schema(conn)?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        info!(location = %shown, "Event store ready");

        Ok(Self { conn })
    }

    /// Execute a closure that returns a rusqlite::Result.
    pub async fn call_sqlite<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)?))
            .await
            .map_err(from_tokio_rusqlite)
    }
}

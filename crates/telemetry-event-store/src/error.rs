//! Event store error types.

use thiserror::Error;

/// Event store error type.
///
/// Every variant means the backing storage could not be opened, read, or
/// written. Callers treat them uniformly as "storage unavailable".
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Executor connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// IO error (e.g. the database directory cannot be created)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for delivery and replay.

use telemetry_event_store::StoreError;
use thiserror::Error;

/// Failure reported by a [`RemoteSender`](crate::RemoteSender).
///
/// The transport turns every variant into a `Failed` outcome.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network, TLS, or timeout error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("Collector error: {status} - {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Any other sender-specific failure.
    #[error("Send failed: {0}")]
    Send(String),
}

/// Errors that can occur while persisting or replaying an event.
///
/// These never reach callers of `send_event` or `flush_pending`; they are
/// logged where they happen.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The remote delivery did not succeed.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(#[from] TransportError),

    /// The event store could not be opened, read, or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The payload could not be serialized or deserialized.
    #[error("Malformed payload for event {event_id}: {reason}")]
    MalformedPayload {
        /// Event whose payload is unusable.
        event_id: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type alias using RelayError.
pub type RelayResult<T> = Result<T, RelayError>;

//! Persistent retry-queue transport for telemetry events.
//!
//! This crate provides:
//! - `CachingTransport`: sends an event and, on failure, stores it for later
//! - `ReplayScheduler`: periodically resubmits stored events as replays
//! - `HttpSender`: `RemoteSender` that POSTs events to a collector
//!
//! ```text
//! caller ──▶ CachingTransport ──▶ RemoteSender ──▶ collector
//!                  │   ▲
//!   insert on fail │   │ replay (delete on success)
//!                  ▼   │
//!              EventStore ◀── ReplayScheduler (timer)
//! ```
//!
//! Neither entry point returns an error. Delivery failures become a `Failed`
//! outcome, and storage or payload problems are logged through `tracing`.

mod error;
mod event;
mod replay;
mod sender;
mod transport;

#[cfg(test)]
mod tests;

pub use error::{RelayError, RelayResult, TransportError};
pub use event::{DeliveryOutcome, OutboundEvent, SendResponse, EVENT_ID_FIELD, REPLAY_MARKER};
pub use replay::{FlushReport, ReplayConfig, ReplayHandle, ReplayScheduler};
pub use sender::{HttpSender, RemoteSender, SenderConfig, SenderHandle};
pub use transport::CachingTransport;

//! Core configuration and utilities for the telemetry relay.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, LogFormat, DEFAULT_COLLECTOR_URL, DEFAULT_LOG_LEVEL, DEFAULT_REPLAY_BATCH_SIZE,
    DEFAULT_REPLAY_CONCURRENCY, DEFAULT_REPLAY_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;

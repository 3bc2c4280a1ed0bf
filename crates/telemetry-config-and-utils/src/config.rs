//! Configuration management for the relay.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default collector endpoint (override at compile time via TELEMETRY_COLLECTOR_URL).
pub const DEFAULT_COLLECTOR_URL: &str = match option_env!("TELEMETRY_COLLECTOR_URL") {
    Some(url) => url,
    None => "http://localhost:8080/api/events",
};

/// Default per-request timeout for the collector.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default period between replay flushes.
pub const DEFAULT_REPLAY_INTERVAL_SECS: u64 = 60;

/// Default number of pending events read per flush.
pub const DEFAULT_REPLAY_BATCH_SIZE: usize = 100;

/// Default number of replays in flight at once.
pub const DEFAULT_REPLAY_CONCURRENCY: usize = 4;

const ENV_LOG_LEVEL: &str = "TELEMETRY_RELAY_LOG_LEVEL";
const ENV_COLLECTOR_URL: &str = "TELEMETRY_RELAY_COLLECTOR_URL";
const ENV_AUTH_HEADER: &str = "TELEMETRY_RELAY_AUTH_HEADER";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Main relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Collector endpoint events are POSTed to.
    #[serde(default = "default_collector_url")]
    pub collector_url: String,
    /// Value of the Authorization header sent to the collector, if any.
    #[serde(default)]
    pub auth_header: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Seconds between replay flushes.
    #[serde(default = "default_replay_interval_secs")]
    pub replay_interval_secs: u64,
    /// Maximum pending events read per flush.
    #[serde(default = "default_replay_batch_size")]
    pub replay_batch_size: usize,
    /// Maximum concurrent replays within one flush.
    #[serde(default = "default_replay_concurrency")]
    pub replay_concurrency: usize,
    /// Flush pending events once as soon as the replay loop starts.
    #[serde(default = "default_flush_on_start")]
    pub flush_on_start: bool,
    /// Override for the pending-event database location.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_collector_url() -> String {
    DEFAULT_COLLECTOR_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_replay_interval_secs() -> u64 {
    DEFAULT_REPLAY_INTERVAL_SECS
}

fn default_replay_batch_size() -> usize {
    DEFAULT_REPLAY_BATCH_SIZE
}

fn default_replay_concurrency() -> usize {
    DEFAULT_REPLAY_CONCURRENCY
}

fn default_flush_on_start() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            collector_url: default_collector_url(),
            auth_header: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            replay_interval_secs: DEFAULT_REPLAY_INTERVAL_SECS,
            replay_batch_size: DEFAULT_REPLAY_BATCH_SIZE,
            replay_concurrency: DEFAULT_REPLAY_CONCURRENCY,
            flush_on_start: true,
            database_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Check values that would otherwise fail later at runtime.
    pub fn validate(&self) -> CoreResult<()> {
        self.collector_url()?;
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.replay_interval_secs == 0 {
            return Err(CoreError::Config(
                "replay_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.replay_batch_size == 0 {
            return Err(CoreError::Config(
                "replay_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the collector URL as a parsed URL.
    pub fn collector_url(&self) -> CoreResult<Url> {
        Url::parse(&self.collector_url).map_err(CoreError::from)
    }

    /// Resolve the database file, honoring `database_path` when set.
    pub fn database_file(&self, paths: &Paths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL).and_then(non_empty) {
            self.log_level = log_level;
        }
        if let Some(url) = lookup(ENV_COLLECTOR_URL).and_then(non_empty) {
            self.collector_url = url;
        }
        if let Some(header) = lookup(ENV_AUTH_HEADER).and_then(non_empty) {
            self.auth_header = Some(header);
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

//! Wiring from configuration to transport and scheduler, plus the command bodies.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use caching_transport::{
    CachingTransport, HttpSender, OutboundEvent, ReplayConfig, ReplayScheduler, SenderConfig,
};
use serde_json::Value;
use telemetry_config_and_utils::{Config, Paths};
use telemetry_event_store::{EventStore, SqliteEventStore, StoreHandle, StoreLocation};
use tracing::info;

/// Everything a command needs, built from one [`Config`].
pub struct Relay {
    pub store: StoreHandle,
    pub transport: Arc<CachingTransport>,
    pub scheduler: Arc<ReplayScheduler>,
}

impl Relay {
    pub fn build(config: &Config, paths: &Paths) -> anyhow::Result<Self> {
        paths.ensure_dirs()?;

        let database = config.database_file(paths);
        let store: StoreHandle = Arc::new(SqliteEventStore::new(StoreLocation::File(database)));

        let sender = HttpSender::new(SenderConfig {
            collector_url: config.collector_url.clone(),
            auth_header: config.auth_header.clone(),
            timeout_secs: config.request_timeout_secs,
        })
        .context("failed to build HTTP client")?;

        let transport = Arc::new(CachingTransport::new(Arc::new(sender), store.clone()));
        let scheduler = Arc::new(ReplayScheduler::new(
            transport.clone(),
            replay_config(config),
        ));

        Ok(Self {
            store,
            transport,
            scheduler,
        })
    }
}

fn replay_config(config: &Config) -> ReplayConfig {
    ReplayConfig {
        batch_size: config.replay_batch_size,
        max_concurrency: config.replay_concurrency,
        interval: Duration::from_secs(config.replay_interval_secs),
        flush_on_start: config.flush_on_start,
    }
}

/// Parse a command-line payload into an outbound event.
fn parse_event(payload: &str, event_id: Option<String>) -> anyhow::Result<OutboundEvent> {
    let value: Value = serde_json::from_str(payload).context("payload is not valid JSON")?;
    if !value.is_object() {
        bail!("payload must be a JSON object");
    }

    Ok(match event_id {
        Some(id) => OutboundEvent::fresh(id, value),
        None => OutboundEvent::from_payload(value),
    })
}

pub async fn send(
    config: &Config,
    paths: &Paths,
    payload: &str,
    event_id: Option<String>,
) -> anyhow::Result<()> {
    let event = parse_event(payload, event_id)?;
    let relay = Relay::build(config, paths)?;

    let response = relay.transport.send_event(&event).await;
    match (response.status_code, response.reason.as_deref()) {
        (Some(status), _) => println!("{} {} (HTTP {})", event.event_id, response.outcome, status),
        (None, Some(reason)) => println!("{} {}: {}", event.event_id, response.outcome, reason),
        (None, None) => println!("{} {}", event.event_id, response.outcome),
    }
    Ok(())
}

pub async fn flush(config: &Config, paths: &Paths) -> anyhow::Result<()> {
    let relay = Relay::build(config, paths)?;
    let report = relay.scheduler.flush_pending().await;
    println!(
        "fetched {}, delivered {}, failed {}, dropped {}",
        report.fetched, report.delivered, report.failed, report.dropped
    );
    Ok(())
}

pub async fn pending(config: &Config, paths: &Paths, limit: usize) -> anyhow::Result<()> {
    let relay = Relay::build(config, paths)?;
    let count = relay.store.count().await?;
    println!("{} pending event(s)", count);

    for event in relay.store.query_batch(limit).await? {
        println!("  {}", event.event_id);
    }
    Ok(())
}

pub async fn run(config: &Config, paths: &Paths) -> anyhow::Result<()> {
    let relay = Relay::build(config, paths)?;
    relay.store.ensure_ready().await?;

    info!(
        collector = %config.collector_url,
        interval_secs = config.replay_interval_secs,
        "Telemetry relay running"
    );
    let handle = relay.scheduler.clone().spawn();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    handle.shutdown().await;
    Ok(())
}

//! Send/store decision tests.
//!
//! Covers each row of the transport's policy table and the rule that the
//! caller always receives the sender's own outcome.

use super::harness::{serve_status_once, Rig, Script};
use crate::{CachingTransport, DeliveryOutcome, HttpSender, OutboundEvent, SenderConfig};
use serde_json::json;
use std::sync::Arc;
use telemetry_event_store::{EventStore, SqliteEventStore};

#[tokio::test]
async fn fresh_delivered_event_is_never_stored() {
    let rig = Rig::new(Script::Deliver);

    let response = rig
        .transport
        .send_event(&OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;

    assert_eq!(response.outcome, DeliveryOutcome::Delivered);
    assert_eq!(response.status_code, Some(200));
    assert!(rig.stored().await.is_empty());
}

#[tokio::test]
async fn fresh_rejected_event_is_stored_with_original_payload() {
    // Scenario A
    let rig = Rig::new(Script::Reject);

    let response = rig
        .transport
        .send_event(&OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;

    assert_eq!(response.outcome, DeliveryOutcome::Failed);
    let stored = rig.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].event_id, "E1");
    assert_eq!(stored[0].payload, r#"{"msg":"a"}"#);
}

#[tokio::test]
async fn transport_error_becomes_failed_outcome_and_is_stored() {
    let rig = Rig::new(Script::Error);

    let response = rig
        .transport
        .send_event(&OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;

    assert_eq!(response.outcome, DeliveryOutcome::Failed);
    assert!(response
        .reason
        .as_deref()
        .unwrap()
        .contains("network unreachable"));
    assert_eq!(rig.stored_ids().await, vec!["E1"]);
}

#[tokio::test]
async fn rejected_status_reaches_the_caller() {
    let rig = Rig::new(Script::Status(429));

    let response = rig
        .transport
        .send_event(&OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;

    assert_eq!(response.outcome, DeliveryOutcome::Failed);
    assert_eq!(response.status_code, Some(429));
    assert_eq!(response.reason.as_deref(), Some("Collector error: 429 - busy"));
    assert_eq!(rig.stored_ids().await, vec!["E1"]);
}

#[tokio::test]
async fn http_collector_error_status_is_reported_and_event_stored() {
    let url = serve_status_once("503 Service Unavailable").await;
    let sender = HttpSender::new(SenderConfig {
        collector_url: url,
        auth_header: None,
        timeout_secs: 5,
    })
    .unwrap();
    let store = Arc::new(SqliteEventStore::in_memory());
    let transport = CachingTransport::new(Arc::new(sender), store.clone());

    let response = transport
        .send_event(&OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;

    assert_eq!(response.outcome, DeliveryOutcome::Failed);
    assert_eq!(response.status_code, Some(503));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn replay_delivered_removes_stored_row() {
    let rig = Rig::new(Script::Deliver);
    rig.store.insert("E1", r#"{"msg":"a"}"#).await.unwrap();

    let replay = OutboundEvent::replay("E1", json!({"msg": "a", "cached": true}));
    let response = rig.transport.send_event(&replay).await;

    assert!(response.is_delivered());
    assert!(rig.stored().await.is_empty());

    // Delivering the same replay again finds nothing to delete and is fine.
    let response = rig.transport.send_event(&replay).await;
    assert!(response.is_delivered());
    assert!(rig.stored().await.is_empty());
}

#[tokio::test]
async fn replay_failed_leaves_row_unchanged() {
    let rig = Rig::new(Script::Reject);
    rig.store.insert("E1", r#"{"msg":"a"}"#).await.unwrap();

    let replay = OutboundEvent::replay("E1", json!({"msg": "changed", "cached": true}));
    let response = rig.transport.send_event(&replay).await;

    assert_eq!(response.outcome, DeliveryOutcome::Failed);
    let stored = rig.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].payload, r#"{"msg":"a"}"#);
}

#[tokio::test]
async fn replay_errors_are_not_reinserted() {
    let rig = Rig::new(Script::Error);

    let replay = OutboundEvent::replay("E9", json!({"cached": true}));
    rig.transport.send_event(&replay).await;

    assert!(rig.stored().await.is_empty());
}

#[tokio::test]
async fn same_event_failing_twice_keeps_one_row_with_latest_payload() {
    let rig = Rig::new(Script::Reject);

    rig.transport
        .send_event(&OutboundEvent::fresh("E1", json!({"attempt": 1})))
        .await;
    rig.transport
        .send_event(&OutboundEvent::fresh("E1", json!({"attempt": 2})))
        .await;

    let stored = rig.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].payload, r#"{"attempt":2}"#);
}

#[tokio::test]
async fn sender_sees_event_exactly_as_submitted() {
    let rig = Rig::new(Script::Deliver);

    rig.transport
        .send_event(&OutboundEvent::from_payload(json!({"event_id": "abc", "level": "error"})))
        .await;

    let sent = rig.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event_id, "abc");
    assert!(!sent[0].is_replay);
    assert_eq!(sent[0].payload, json!({"event_id": "abc", "level": "error"}));
}

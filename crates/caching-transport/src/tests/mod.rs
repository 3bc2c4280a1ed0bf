//! Behavioral tests for the caching transport and replay scheduler.
//!
//! - `policy.rs`      - send/store decision for fresh and replayed events
//! - `replay.rs`      - flushing stored events, batch bounds, poison pills
//! - `failures.rs`    - storage and payload failures never reach the caller
//! - `concurrency.rs` - concurrent sends, flushes, and the timer loop

mod policy;

use harness::{Rig, Script};
use serde_json::json;

/// A failed event is stored, then delivered and removed by the next flush.
#[tokio::test]
async fn basic_workflow() {
    let rig = Rig::new(Script::Reject);

    let response = rig
        .transport
        .send_event(&crate::OutboundEvent::fresh("E1", json!({"msg": "a"})))
        .await;
    assert!(!response.is_delivered());
    assert_eq!(rig.stored_ids().await, vec!["E1"]);

    rig.sender.set_default(Script::Deliver);
    let report = rig.scheduler().flush_pending().await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.delivered, 1);
    assert!(rig.stored_ids().await.is_empty());
}

//! The send-now-or-store-for-later decision point.

use crate::{DeliveryOutcome, OutboundEvent, RelayResult, SendResponse, SenderHandle};
use telemetry_event_store::StoreHandle;
use tracing::{debug, error, info, warn};

/// Sends events through a [`RemoteSender`](crate::RemoteSender) and keeps the
/// event store in step with the result.
///
/// | replay | outcome   | store action |
/// |--------|-----------|--------------|
/// | no     | delivered | none         |
/// | no     | failed    | insert       |
/// | yes    | delivered | delete       |
/// | yes    | failed    | none         |
///
/// The response returned to the caller is always the sender's, whatever
/// happens to the store afterwards.
pub struct CachingTransport {
    sender: SenderHandle,
    store: StoreHandle,
}

impl CachingTransport {
    /// Compose a transport from a sender and a store.
    pub fn new(sender: SenderHandle, store: StoreHandle) -> Self {
        Self { sender, store }
    }

    /// The store this transport persists into.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Send one event. Never fails; see the type-level table for side effects.
    pub async fn send_event(&self, event: &OutboundEvent) -> SendResponse {
        let response = match self.sender.send(event).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    event_id = %event.event_id,
                    replay = event.is_replay,
                    error = %e,
                    "Event delivery failed"
                );
                SendResponse::from_error(&e)
            }
        };

        debug!(
            event_id = %event.event_id,
            replay = event.is_replay,
            outcome = %response.outcome,
            "Send attempt finished"
        );

        match (event.is_replay, response.outcome) {
            (false, DeliveryOutcome::Delivered) => {}
            (false, DeliveryOutcome::Failed) => {
                if let Err(e) = self.persist(event).await {
                    error!(event_id = %event.event_id, error = %e, "Failed to store undelivered event");
                }
            }
            (true, DeliveryOutcome::Delivered) => {
                if let Err(e) = self.purge(event).await {
                    error!(event_id = %event.event_id, error = %e, "Failed to remove replayed event");
                }
            }
            (true, DeliveryOutcome::Failed) => {
                debug!(event_id = %event.event_id, "Replay failed, keeping event for next flush");
            }
        }

        response
    }

    async fn persist(&self, event: &OutboundEvent) -> RelayResult<()> {
        let payload = event.serialize_payload()?;
        self.store.insert(&event.event_id, &payload).await?;
        info!(event_id = %event.event_id, "Stored undelivered event for replay");
        Ok(())
    }

    async fn purge(&self, event: &OutboundEvent) -> RelayResult<()> {
        let removed = self.store.delete(&event.event_id).await?;
        if removed {
            info!(event_id = %event.event_id, "Replayed event delivered and removed");
        } else {
            debug!(event_id = %event.event_id, "Replayed event was already removed");
        }
        Ok(())
    }
}

//! Events flowing through the transport and the results of sending them.

use crate::{RelayError, RelayResult, TransportError};
use serde_json::Value;
use telemetry_event_store::PendingEvent;

/// Payload key marking an event as a replay of a stored one.
pub const REPLAY_MARKER: &str = "cached";

/// Payload key carrying the event id.
pub const EVENT_ID_FIELD: &str = "event_id";

/// An event on its way to the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Unique event identifier; also the store key.
    pub event_id: String,
    /// Event body as JSON.
    pub payload: Value,
    /// True when this is a resubmission of a stored event.
    pub is_replay: bool,
}

impl OutboundEvent {
    /// A freshly generated event.
    pub fn fresh(event_id: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: event_id.into(),
            payload,
            is_replay: false,
        }
    }

    /// A resubmission of a stored event. The payload should already carry the
    /// replay marker; see [`OutboundEvent::from_pending`].
    pub fn replay(event_id: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: event_id.into(),
            payload,
            is_replay: true,
        }
    }

    /// Build an event from a payload object.
    ///
    /// The id comes from the payload's `event_id` field; when absent a UUIDv4
    /// is generated and written back into the payload. A payload carrying
    /// `"cached": true` is treated as a replay.
    pub fn from_payload(mut payload: Value) -> Self {
        let existing = payload
            .get(EVENT_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let event_id = match existing {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                if let Value::Object(map) = &mut payload {
                    map.insert(EVENT_ID_FIELD.to_string(), Value::String(id.clone()));
                }
                id
            }
        };

        let is_replay = payload
            .get(REPLAY_MARKER)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            event_id,
            payload,
            is_replay,
        }
    }

    /// Rebuild a stored event for resubmission, tagged as a replay.
    ///
    /// The stored text must parse as a JSON object so the replay marker can be
    /// attached; anything else is a malformed payload.
    pub fn from_pending(pending: &PendingEvent) -> RelayResult<Self> {
        let malformed = |reason: String| RelayError::MalformedPayload {
            event_id: pending.event_id.clone(),
            reason,
        };

        let mut payload: Value =
            serde_json::from_str(&pending.payload).map_err(|e| malformed(e.to_string()))?;

        match &mut payload {
            Value::Object(map) => {
                map.insert(REPLAY_MARKER.to_string(), Value::Bool(true));
            }
            _ => return Err(malformed("expected a JSON object".to_string())),
        }

        Ok(Self::replay(pending.event_id.clone(), payload))
    }

    /// Serialize the payload to the text form kept in the store.
    pub fn serialize_payload(&self) -> RelayResult<String> {
        serde_json::to_string(&self.payload).map_err(|e| RelayError::MalformedPayload {
            event_id: self.event_id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Whether the collector accepted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector confirmed receipt.
    Delivered,
    /// The event did not reach the collector.
    Failed,
}

impl DeliveryOutcome {
    /// Lowercase label for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one send attempt, with whatever metadata the sender supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    /// Delivered or failed.
    pub outcome: DeliveryOutcome,
    /// HTTP status, when the sender talks HTTP and got an answer.
    pub status_code: Option<u16>,
    /// Why delivery failed, if it did.
    pub reason: Option<String>,
}

impl SendResponse {
    /// A successful delivery.
    pub fn delivered(status_code: Option<u16>) -> Self {
        Self {
            outcome: DeliveryOutcome::Delivered,
            status_code,
            reason: None,
        }
    }

    /// A failed delivery.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: DeliveryOutcome::Failed,
            status_code: None,
            reason: Some(reason.into()),
        }
    }

    /// A failed delivery built from a sender error, keeping the collector's
    /// status code when it answered.
    pub fn from_error(error: &TransportError) -> Self {
        let status_code = match error {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            TransportError::Send(_) => None,
        };

        Self {
            status_code,
            ..Self::failed(error.to_string())
        }
    }

    /// Whether the collector accepted the event.
    pub fn is_delivered(&self) -> bool {
        self.outcome == DeliveryOutcome::Delivered
    }
}

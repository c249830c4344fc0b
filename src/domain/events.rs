//! Domain events
//!
//! Signals published between services. Creation emits `TransferEvent::Created`
//! which the dispatcher turns into exactly one execution attempt.

use serde::{Deserialize, Serialize};

use super::TransferRequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransferEvent {
    Created { request_id: TransferRequestId },
}

impl TransferEvent {
    pub fn request_id(&self) -> TransferRequestId {
        match self {
            TransferEvent::Created { request_id } => *request_id,
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::Created { .. } => "TransferCreated",
        }
    }
}

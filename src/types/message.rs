use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Server-assigned message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        MessageId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A message the backend knows about (confirmed, has a server id)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }
}

/// Local id for a message that has not been confirmed yet
pub type LocalMessageId = u64;

/// Delivery state of an optimistic outgoing message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    Sending,
    Failed,
}

/// A message the user sent that the server has not echoed back yet
#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingMessage {
    pub local_id: LocalMessageId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub state: DeliveryState,
}

impl OutgoingMessage {
    pub fn new(local_id: LocalMessageId, text: String) -> Self {
        Self {
            local_id,
            text,
            created_at: Utc::now(),
            state: DeliveryState::Sending,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RoomId, UserId, UserProfile};

/// Payload of a chat message.
///
/// A sealed message carries only its envelope; the plaintext exists solely as
/// the result of decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageBody {
    Plain { text: String },
    /// `base64(nonce || ciphertext)` under the room key
    Sealed { envelope: String },
}

impl MessageBody {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Sealed { .. })
    }
}

/// Sender reference attached to each message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

impl From<&UserProfile> for Sender {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name.clone(),
            avatar_ref: profile.avatar_ref.clone(),
        }
    }
}

/// One chat line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub room_id: RoomId,
    pub sender: Sender,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(room_id: RoomId, sender: Sender, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            sender,
            body,
            timestamp: Utc::now(),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.body.is_encrypted()
    }

    pub fn is_from(&self, user: UserId) -> bool {
        self.sender.id == user
    }
}

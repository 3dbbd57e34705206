use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-agnostic chat message model
///
/// Messages are immutable once created; `updated_at` exists structurally but
/// no update path writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    /// A user id, or the literal "system" identity for assistant turns
    pub sender_id: String,
    pub role: MessageRole,
    pub message_type: MessageType,
    pub content: String,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
}

/// Free-form per-message metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    #[serde(default)]
    pub has_voice: bool,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MessageMetadata {
    pub fn timestamped() -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }
}

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageMetadata, MessageRole, MessageType, Thread, ThreadMetadata};

/// MongoDB representation of a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub ai_response: String,
    pub confidence_score: f64,
    pub metadata: ThreadMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MongoThread> for Thread {
    fn from(t: MongoThread) -> Self {
        Thread {
            id: t.id.to_hex(),
            user_id: t.user_id,
            title: t.title,
            content: t.content,
            ai_response: t.ai_response,
            confidence_score: t.confidence_score,
            metadata: t.metadata,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// MongoDB representation of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: ObjectId,
    pub sender_id: String,
    pub role: MessageRole,
    pub message_type: MessageType,
    pub content: String,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MongoMessage> for Message {
    fn from(m: MongoMessage) -> Self {
        Message {
            id: m.id.to_hex(),
            thread_id: m.thread_id.to_hex(),
            sender_id: m.sender_id,
            role: m.role,
            message_type: m.message_type,
            content: m.content,
            metadata: m.metadata,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{KnowledgeSnippet, Message, MessageMetadata, MessageRole, MessageType, Thread, ThreadMetadata};

/// Input for creating a thread. Identity and timestamps are assigned by the
/// store, never by the caller.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub confidence_score: f64,
    pub metadata: ThreadMetadata,
}

/// Input for appending a message to a thread.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub thread_id: String,
    pub sender_id: String,
    pub role: MessageRole,
    pub message_type: MessageType,
    pub content: String,
    pub metadata: MessageMetadata,
}

impl NewMessage {
    pub fn text(
        thread_id: impl Into<String>,
        sender_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            sender_id: sender_id.into(),
            role,
            message_type: MessageType::Text,
            content: content.into(),
            metadata: MessageMetadata::timestamped(),
        }
    }
}

/// Persistence boundary for conversation threads and messages.
///
/// Messages are append-only: `append_message` never overwrites, and
/// `list_messages` always returns ascending creation order with identical
/// results across calls absent new writes.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn create_thread(&self, new: NewThread) -> Result<Thread>;

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Threads for a user, most recent activity first
    async fn list_threads(&self, user_id: &str) -> Result<Vec<Thread>>;

    async fn append_message(&self, new: NewMessage) -> Result<Message>;

    /// Messages of a thread in ascending creation order. A deleted or
    /// unknown thread yields an empty sequence.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Update the thread's cached last-response, confidence and activity
    /// timestamp after a completed turn.
    async fn record_turn(&self, thread_id: &str, ai_response: &str, confidence: f64) -> Result<()>;

    /// Delete a thread and everything it owns. Messages are removed before
    /// the thread row so a failure can never orphan messages.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;
}

/// Read-only reference data consumed during context assembly.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>>;
}

//! In-memory store used by tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{KnowledgeSnippet, Message, Thread};
use crate::store::{KnowledgeBase, NewMessage, NewThread, ThreadStore};

#[derive(Default)]
struct Inner {
    threads: Vec<Thread>,
    // Insertion order is creation order; list_messages relies on it.
    messages: Vec<Message>,
}

/// Thread/message store backed by process memory.
///
/// Every operation takes the lock for a short synchronous section only, so
/// the store is safe to share behind an `Arc` across handler tasks.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PersistError::Internal("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ThreadStore for InMemoryStore {
    async fn create_thread(&self, new: NewThread) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            title: new.title,
            content: new.content,
            ai_response: String::new(),
            confidence_score: new.confidence_score,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.threads.push(thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        Ok(self
            .lock()?
            .threads
            .iter()
            .find(|t| t.id == thread_id)
            .cloned())
    }

    async fn list_threads(&self, user_id: &str) -> Result<Vec<Thread>> {
        let mut threads: Vec<Thread> = self
            .lock()?
            .threads
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    async fn append_message(&self, new: NewMessage) -> Result<Message> {
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            thread_id: new.thread_id,
            sender_id: new.sender_id,
            role: new.role,
            message_type: new.message_type,
            content: new.content,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn record_turn(&self, thread_id: &str, ai_response: &str, confidence: f64) -> Result<()> {
        let mut inner = self.lock()?;
        let thread = inner
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;

        thread.ai_response = ai_response.to_string();
        thread.confidence_score = confidence;
        thread.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut inner = self.lock()?;
        // Messages first, then the thread row.
        inner.messages.retain(|m| m.thread_id != thread_id);
        inner.threads.retain(|t| t.id != thread_id);
        Ok(())
    }
}

/// Knowledge base backed by a fixed snippet list.
pub struct StaticKnowledgeBase {
    snippets: Vec<KnowledgeSnippet>,
}

impl StaticKnowledgeBase {
    pub fn new(snippets: Vec<KnowledgeSnippet>) -> Self {
        Self { snippets }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl KnowledgeBase for StaticKnowledgeBase {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>> {
        Ok(self
            .snippets
            .iter()
            .filter(|s| s.matches(query))
            .take(limit)
            .cloned()
            .collect())
    }
}

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::{bson::doc, Client, Collection};

use crate::error::{PersistError, Result};
use crate::models::{KnowledgeSnippet, Message, Thread};
use crate::mongo::models::{MongoMessage, MongoThread};
use crate::store::{KnowledgeBase, NewMessage, NewThread, ThreadStore};

fn parse_oid(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PersistError::InvalidObjectId(id.to_string()))
}

/// Thread/message store backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoStore {
    threads: Collection<MongoThread>,
    messages: Collection<MongoMessage>,
}

impl MongoStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            threads: db.collection("threads"),
            messages: db.collection("messages"),
        }
    }
}

#[async_trait]
impl ThreadStore for MongoStore {
    async fn create_thread(&self, new: NewThread) -> Result<Thread> {
        let now = Utc::now();
        let thread = MongoThread {
            id: ObjectId::new(),
            user_id: new.user_id,
            title: new.title,
            content: new.content,
            ai_response: String::new(),
            confidence_score: new.confidence_score,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        self.threads.insert_one(&thread).await?;
        Ok(thread.into())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let oid = parse_oid(thread_id)?;
        let filter = doc! { "_id": oid };
        Ok(self.threads.find_one(filter).await?.map(Into::into))
    }

    async fn list_threads(&self, user_id: &str) -> Result<Vec<Thread>> {
        let filter = doc! { "user_id": user_id };
        let threads: Vec<MongoThread> = self
            .threads
            .find(filter)
            .sort(doc! { "updated_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads.into_iter().map(Into::into).collect())
    }

    async fn append_message(&self, new: NewMessage) -> Result<Message> {
        let now = Utc::now();
        let message = MongoMessage {
            id: ObjectId::new(),
            thread_id: parse_oid(&new.thread_id)?,
            sender_id: new.sender_id,
            role: new.role,
            message_type: new.message_type,
            content: new.content,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        self.messages.insert_one(&message).await?;
        Ok(message.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let oid = parse_oid(thread_id)?;
        let filter = doc! { "thread_id": oid };
        let messages: Vec<MongoMessage> = self
            .messages
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn record_turn(&self, thread_id: &str, ai_response: &str, confidence: f64) -> Result<()> {
        let oid = parse_oid(thread_id)?;
        let filter = doc! { "_id": oid };
        let update = doc! {
            "$set": {
                "ai_response": ai_response,
                "confidence_score": confidence,
                "updated_at": bson::DateTime::now(),
            }
        };

        let result = self.threads.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let oid = parse_oid(thread_id)?;
        // Messages first so a failure between the two deletes can never
        // leave messages referencing a missing thread.
        self.messages
            .delete_many(doc! { "thread_id": oid })
            .await?;
        self.threads.delete_one(doc! { "_id": oid }).await?;
        Ok(())
    }
}

/// Knowledge base backed by a MongoDB collection.
#[derive(Clone)]
pub struct MongoKnowledgeBase {
    collection: Collection<KnowledgeSnippet>,
}

impl MongoKnowledgeBase {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("knowledge_base");
        Self { collection }
    }
}

#[async_trait]
impl KnowledgeBase for MongoKnowledgeBase {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>> {
        let keywords: Vec<String> = query
            .split_whitespace()
            .filter(|w| w.len() >= 4)
            .map(regex_escape)
            .collect();

        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<bson::Document> = keywords
            .iter()
            .flat_map(|kw| {
                ["title", "content", "tags"].into_iter().map(move |field| {
                    doc! { field: { "$regex": kw.clone(), "$options": "i" } }
                })
            })
            .collect();

        let snippets: Vec<KnowledgeSnippet> = self
            .collection
            .find(doc! { "$or": clauses })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(snippets)
    }
}

fn regex_escape(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_oid_rejects_garbage() {
        assert!(matches!(
            parse_oid("not-an-oid"),
            Err(PersistError::InvalidObjectId(_))
        ));
    }

    #[test]
    fn regex_escape_neutralizes_metacharacters() {
        assert_eq!(regex_escape("a.b*c"), "a\\.b\\*c");
        assert_eq!(regex_escape("plain"), "plain");
    }
}

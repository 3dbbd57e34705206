use async_trait::async_trait;

use techpulse_persist::{Message, Thread};

use crate::error::{ClientError, Result};
use crate::wire::{
    AckReply, CreateThreadPayload, MessagesReply, SendMessagePayload, SendMessageReply,
    ThreadReply, ThreadsReply,
};

/// The chat API surface as seen by the controller. Injected so the
/// controller is testable against scripted responses.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, payload: SendMessagePayload) -> Result<SendMessageReply>;
    async fn get_threads(&self, user_id: &str) -> Result<Vec<Thread>>;
    async fn get_thread_messages(&self, thread_id: &str, user_id: &str) -> Result<Vec<Message>>;
    async fn create_thread(&self, payload: CreateThreadPayload) -> Result<Thread>;
    async fn delete_thread(&self, thread_id: &str, user_id: &str) -> Result<()>;
}

/// HTTP implementation talking to a TechPulse chat server.
pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-2xx response into a typed error, preferring the
    /// server's `error` field over the bare status line.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<crate::wire::ErrorReply>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("HTTP error! status: {status}"));
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(&self, payload: SendMessagePayload) -> Result<SendMessageReply> {
        let response = self
            .http
            .post(self.url("/api/chat/send"))
            .json(&payload)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_threads(&self, user_id: &str) -> Result<Vec<Thread>> {
        let response = self
            .http
            .get(self.url("/api/chat/threads"))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        let reply: ThreadsReply = Self::check(response).await?.json().await?;
        Ok(reply.threads)
    }

    async fn get_thread_messages(&self, thread_id: &str, user_id: &str) -> Result<Vec<Message>> {
        let response = self
            .http
            .get(self.url(&format!("/api/chat/threads/{thread_id}")))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        let reply: MessagesReply = Self::check(response).await?.json().await?;
        Ok(reply.messages)
    }

    async fn create_thread(&self, payload: CreateThreadPayload) -> Result<Thread> {
        let response = self
            .http
            .post(self.url("/api/chat/threads"))
            .json(&payload)
            .send()
            .await?;
        let reply: ThreadReply = Self::check(response).await?.json().await?;
        Ok(reply.thread)
    }

    async fn delete_thread(&self, thread_id: &str, user_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/api/chat/threads/{thread_id}")))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        let _: AckReply = Self::check(response).await?.json().await?;
        Ok(())
    }
}

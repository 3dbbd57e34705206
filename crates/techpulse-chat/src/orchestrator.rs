//! Request/response turn handling.
//!
//! A turn is an append-only log write: the user message is persisted before
//! the model is invoked, so a backend failure never loses the user's input.
//! Calling `handle_turn` twice with identical input appends two independent
//! pairs; nothing is deduplicated.

use std::sync::Arc;
use std::time::Duration;

use techpulse_llm::{ChatClient, ChatOptions, ChatRequest};
use techpulse_persist::{
    derive_title, KnowledgeBase, Message, MessageMetadata, MessageRole, MessageType, NewMessage,
    NewThread, ThreadMetadata, ThreadStore,
};

use crate::context::ContextAssembler;
use crate::error::{ChatError, Result};

const TITLE_MAX_CHARS: usize = 50;
const KNOWLEDGE_LIMIT: usize = 5;
const ASSISTANT_SENDER: &str = "system";
const FALLBACK_RESPONSE: &str = "Sorry, I could not generate a response.";

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: String,
    pub message: String,
    pub thread_id: Option<String>,
    pub has_voice: bool,
    pub attachments: Vec<String>,
}

impl TurnRequest {
    pub fn text(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            thread_id: None,
            has_voice: false,
            attachments: Vec::new(),
        }
    }

    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub thread_id: String,
    pub user_message: Message,
    pub assistant_message: Message,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub llm_timeout: Duration,
    pub confidence: f64,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            llm_timeout: Duration::from_secs(60),
            confidence: 0.9,
        }
    }
}

pub struct ChatOrchestrator {
    store: Arc<dyn ThreadStore>,
    knowledge: Arc<dyn KnowledgeBase>,
    llm: Arc<dyn ChatClient>,
    assembler: ContextAssembler,
    settings: TurnSettings,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        knowledge: Arc<dyn KnowledgeBase>,
        llm: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            store,
            knowledge,
            llm,
            assembler: ContextAssembler::new(),
            settings: TurnSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TurnSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Run one full turn: validate, resolve/create the thread, persist the
    /// user message, assemble context, call the model, persist the
    /// assistant message, update the thread summary, return both turns.
    pub async fn handle_turn(&self, req: TurnRequest) -> Result<TurnOutcome> {
        self.validate(&req)?;

        let thread_id = self.resolve_thread(&req).await?;

        // Durability boundary: the user turn is persisted before the model
        // call and is never rolled back on failure.
        let mut user_meta = MessageMetadata::timestamped();
        user_meta.has_voice = req.has_voice;
        user_meta.attachments = req.attachments.clone();

        let user_message = self
            .store
            .append_message(NewMessage {
                thread_id: thread_id.clone(),
                sender_id: req.user_id.clone(),
                role: MessageRole::User,
                message_type: MessageType::Text,
                content: req.message.clone(),
                metadata: user_meta,
            })
            .await?;

        // History excludes the in-flight turn; it is appended once, at the
        // end of the prompt.
        let history: Vec<Message> = self
            .store
            .list_messages(&thread_id)
            .await?
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();

        let snippets = self
            .knowledge
            .search(&req.message, KNOWLEDGE_LIMIT)
            .await?;

        let prompt = self.assembler.assemble(&snippets, &history, &req.message);

        let response = self.invoke_model(prompt).await?;
        let response_text = response
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_RESPONSE.to_string());

        let mut assistant_meta = MessageMetadata::timestamped();
        assistant_meta.model = Some(self.settings.model.clone());
        assistant_meta.tokens = response.usage.map(|u| u.total_tokens);

        let assistant_message = self
            .store
            .append_message(NewMessage {
                thread_id: thread_id.clone(),
                sender_id: ASSISTANT_SENDER.to_string(),
                role: MessageRole::Assistant,
                message_type: MessageType::Text,
                content: response_text.clone(),
                metadata: assistant_meta,
            })
            .await?;

        self.store
            .record_turn(&thread_id, &response_text, self.settings.confidence)
            .await?;

        tracing::info!(thread_id = %thread_id, "chat turn completed");

        Ok(TurnOutcome {
            thread_id,
            user_message,
            assistant_message,
            response: response_text,
        })
    }

    fn validate(&self, req: &TurnRequest) -> Result<()> {
        if req.user_id.trim().is_empty() {
            return Err(ChatError::Validation("userId is required".to_string()));
        }
        if req.message.trim().is_empty() && !req.has_voice && req.attachments.is_empty() {
            return Err(ChatError::Validation(
                "message is required when no voice or attachment content exists".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve an existing thread (ownership checked, fails closed) or
    /// create a new one titled after the first message.
    async fn resolve_thread(&self, req: &TurnRequest) -> Result<String> {
        if let Some(thread_id) = &req.thread_id {
            let thread = self
                .store
                .get_thread(thread_id)
                .await?
                .filter(|t| t.user_id == req.user_id)
                .ok_or_else(|| ChatError::ThreadNotFound(thread_id.clone()))?;
            return Ok(thread.id);
        }

        let thread = self
            .store
            .create_thread(NewThread {
                user_id: req.user_id.clone(),
                title: derive_title(&req.message, TITLE_MAX_CHARS),
                content: req.message.clone(),
                confidence_score: self.settings.confidence,
                metadata: ThreadMetadata {
                    source: Some("chat_interface".to_string()),
                    user_id: Some(req.user_id.clone()),
                    tags: Vec::new(),
                },
            })
            .await?;

        tracing::debug!(thread_id = %thread.id, "created thread for new conversation");
        Ok(thread.id)
    }

    async fn invoke_model(
        &self,
        prompt: Vec<techpulse_llm::Message>,
    ) -> Result<techpulse_llm::ChatResponse> {
        let request = ChatRequest::new(self.settings.model.clone(), prompt).with_options(
            ChatOptions::new()
                .temperature(self.settings.temperature)
                .max_tokens(self.settings.max_tokens)
                .timeout(self.settings.llm_timeout),
        );

        match tokio::time::timeout(self.settings.llm_timeout, self.llm.chat(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "language model call failed");
                Err(ChatError::Upstream(e.to_string()))
            }
            Err(_) => Err(ChatError::Timeout(self.settings.llm_timeout)),
        }
    }
}

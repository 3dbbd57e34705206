use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for chat-based LLM interactions (GPT-4, etc)
///
/// Non-streaming request/response completions for conversational use cases.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Trait for speech-to-text interactions (Whisper, etc)
#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcription>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Hard bound on the whole completion call. Completions without a bound
    /// can hang a turn indefinitely, so callers are expected to set one.
    pub timeout: Option<Duration>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub raw: serde_json::Value,
}

/// Audio payload handed to a speech backend.
///
/// The bytes are an already-encoded container (wav/webm/mp3/...), not raw
/// PCM; `mime` names the container so the backend can decode it.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub file_name: String,
    pub mime: String,
    pub data: Vec<u8>,
    pub language: Option<String>,
    pub temperature: Option<f32>,
    pub timeout: Option<Duration>,
}

impl TranscribeRequest {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data,
            language: None,
            temperature: None,
            timeout: None,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub language: Option<String>,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

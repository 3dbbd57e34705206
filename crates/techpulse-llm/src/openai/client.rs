// OpenAI-specific client implementation

use crate::traits::{
    ChatClient, ChatOptions, ChatRequest, ChatResponse, SpeechClient, TokenUsage,
    TranscribeRequest, Transcription,
};
use crate::types::{Content, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const WHISPER_MODEL: &str = "whisper-1";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build chat completion request payload
    fn build_chat_request(
        &self,
        model: &str,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<Value> {
        let openai_messages: Vec<Value> = messages
            .into_iter()
            .map(convert_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = serde_json::json!({
            "model": model,
            "messages": openai_messages,
        });

        let obj = request
            .as_object_mut()
            .context("chat payload is not an object")?;

        if let Some(temp) = options.temperature {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
        }

        Ok(request)
    }
}

/// Convert our Message type to OpenAI format
fn convert_message(message: Message) -> Result<Value> {
    let (role, content, name) = match message {
        Message::System { content, name } => ("system", content, name),
        Message::Human { content, name } => ("user", content, name),
        Message::AI { content, name } => ("assistant", content, name),
    };

    let mut obj = serde_json::json!({
        "role": role,
        "content": convert_content(content)?,
    });
    if let Some(name) = name {
        obj.as_object_mut()
            .context("message payload is not an object")?
            .insert("name".to_string(), serde_json::json!(name));
    }
    Ok(obj)
}

/// Convert Content to OpenAI format (string or array)
fn convert_content(content: Content) -> Result<Value> {
    match content {
        Content::Text(s) => Ok(serde_json::json!(s)),
        Content::Parts(parts) => {
            let converted: Vec<Value> = parts
                .into_iter()
                .map(|part| match part {
                    crate::types::ContentPart::Text { text } => {
                        serde_json::json!({
                            "type": "text",
                            "text": text,
                        })
                    }
                })
                .collect();
            Ok(serde_json::json!(converted))
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request.model, request.messages, &request.options)?;

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload);

        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        // Convert to provider-agnostic response
        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: Some(TokenUsage {
                input_tokens: raw.usage.prompt_tokens,
                output_tokens: raw.usage.completion_tokens,
                total_tokens: raw.usage.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(raw)?,
        })
    }
}

#[async_trait]
impl SpeechClient for OpenAIClient {
    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcription> {
        let file_part = multipart::Part::bytes(request.data)
            .file_name(request.file_name)
            .mime_str(&request.mime)
            .context("Invalid audio MIME type")?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", WHISPER_MODEL);

        if let Some(language) = request.language {
            form = form.text("language", language);
        }
        if let Some(temperature) = request.temperature {
            form = form.text("temperature", temperature.to_string());
        }

        let mut builder = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let raw: WhisperResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        tracing::debug!(chars = raw.text.len(), "transcription received");

        Ok(Transcription {
            text: raw.text,
            language: raw.language,
            duration_seconds: raw.duration,
        })
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperResponse {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

use serde_json::Value;

use crate::error::{ClientError, Result};

/// Fallback text the relay substitutes when the outbound call fails.
/// User-visible contract: transport errors never reach the end user raw.
pub const RELAY_FALLBACK_TEXT: &str =
    "I'm having trouble connecting to the backend service. Please try again in a moment.";

/// Pull displayable reply text out of a relayed workflow response.
///
/// Workflow payload shapes are not negotiated, so extraction probes a
/// fixed field order: `response`, `message`, `text`, `output`. A bare
/// string passes through as-is; anything else falls back to the
/// serialized payload.
pub fn extract_reply(value: &Value) -> String {
    if let Value::String(s) = value {
        return s.clone();
    }
    for field in ["response", "message", "text", "output"] {
        if let Some(Value::String(s)) = value.get(field) {
            return s.clone();
        }
    }
    value.to_string()
}

/// Client for the server's webhook relay endpoint.
pub struct WebhookRelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl WebhookRelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Relay a payload to the workflow bus. Both success and the relay's
    /// typed failure envelope come back as JSON; callers use
    /// `extract_reply` to get displayable text from either.
    pub async fn send(&self, webhook_type: &str, payload: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/api/webhook-proxy", self.base_url))
            .query(&[("type", webhook_type)])
            .json(payload)
            .send()
            .await?;

        response.json().await.map_err(|e| ClientError::Transport(e.to_string()))
    }

    /// Probe the relay: metadata including the configured webhook types.
    pub async fn service_status(&self) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}/api/webhook-proxy", self.base_url))
            .send()
            .await?;
        response.json().await.map_err(|e| ClientError::Transport(e.to_string()))
    }
}

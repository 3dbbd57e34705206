use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// Upload cap enforced before any network call.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Container types the transcription service accepts. Compared against the
/// buffer's base MIME, so codec suffixes never cause a rejection.
const ALLOWED_MIME: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/webm",
    "audio/ogg",
    "audio/m4a",
    "audio/mp4",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Transport seam for the transcription call, so session logic is testable
/// without a server.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn transcribe(&self, buffer: &AudioBuffer) -> Result<TranscriptionResult>;
}

/// Backend that POSTs the recording to the transcription endpoint as
/// multipart form data. The endpoint holds the upstream credential; this
/// client never sees an API key.
pub struct HttpTranscriptionBackend {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTranscriptionBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TranscriptionBackend for HttpTranscriptionBackend {
    async fn transcribe(&self, buffer: &AudioBuffer) -> Result<TranscriptionResult> {
        let part = reqwest::multipart::Part::bytes(buffer.data().to_vec())
            .file_name(buffer.file_name())
            .mime_str(buffer.base_mime())
            .map_err(|e| AudioError::Validation(format!("Invalid MIME type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AudioError::Timeout(self.timeout)
                } else {
                    AudioError::Upstream {
                        status: None,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AudioError::Upstream {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        response
            .json::<TranscriptionResult>()
            .await
            .map_err(|e| AudioError::Upstream {
                status: Some(status.as_u16()),
                message: format!("malformed transcription response: {e}"),
            })
    }
}

/// Validates recordings and forwards them to a backend.
pub struct TranscriptionClient {
    backend: Box<dyn TranscriptionBackend>,
}

impl TranscriptionClient {
    pub fn new(backend: Box<dyn TranscriptionBackend>) -> Self {
        Self { backend }
    }

    /// Validate the buffer locally, then transcribe. Validation failures
    /// never reach the backend.
    pub async fn transcribe(&self, buffer: &AudioBuffer) -> Result<TranscriptionResult> {
        validate_upload(buffer.len(), buffer.base_mime())?;

        let result = self.backend.transcribe(buffer).await?;
        if result.text.trim().is_empty() {
            return Err(AudioError::Upstream {
                status: None,
                message: "Transcription returned no text".to_string(),
            });
        }
        Ok(result)
    }
}

/// Shared upload gate: size and container checks applied both by the
/// local client and by the server endpoint, before anything is forwarded.
/// `mime` is the base MIME type, codec suffix already stripped.
pub fn validate_upload(size: usize, mime: &str) -> Result<()> {
    if size == 0 {
        return Err(AudioError::Validation(
            "No audio file provided".to_string(),
        ));
    }
    if size > MAX_AUDIO_BYTES {
        return Err(AudioError::Validation(
            "File size too large. Maximum size is 25MB".to_string(),
        ));
    }
    if !ALLOWED_MIME.contains(&mime) {
        return Err(AudioError::Validation(format!(
            "Unsupported file format: {mime}"
        )));
    }
    Ok(())
}

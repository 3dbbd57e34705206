use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use techpulse_audio::{validate_upload, MAX_AUDIO_BYTES};
use techpulse_llm::TranscribeRequest;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TranscribeReply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub confidence: f64,
}

/// POST /api/transcribe. Multipart upload, validated here before a byte
/// is forwarded upstream. The upstream credential never leaves this
/// process.
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeReply>, ApiError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("recording.webm")
            .to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read audio field: {e}")))?
            .to_vec();
        upload = Some((file_name, mime, data));
        break;
    }

    let (file_name, mime, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    // `audio/webm;codecs=opus` validates as `audio/webm`.
    let base_mime = mime.split(';').next().unwrap_or(&mime).trim().to_string();
    validate_upload(data.len(), &base_mime)?;

    tracing::debug!(size = data.len(), mime = %base_mime, "forwarding audio upstream");

    let cfg = &state.config.transcription;
    let request = TranscribeRequest::new(file_name, base_mime, data)
        .language(cfg.language.clone())
        .temperature(cfg.temperature)
        .timeout(Duration::from_secs(cfg.timeout_secs));

    let transcription = state
        .speech
        .transcribe(request)
        .await
        .map_err(|e| ApiError::internal("Failed to transcribe audio", e.to_string()))?;

    Ok(Json(TranscribeReply {
        text: transcription.text,
        language: transcription.language,
        duration: transcription.duration_seconds,
        confidence: 1.0,
    }))
}

/// GET /api/transcribe. Service probe.
pub async fn transcribe_info() -> Json<Value> {
    Json(json!({
        "message": "TechPulse Transcription API",
        "status": "active",
        "maxFileSizeBytes": MAX_AUDIO_BYTES,
    }))
}

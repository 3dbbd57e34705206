use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use techpulse_audio::AudioError;
use techpulse_chat::ChatError;
use techpulse_client::ErrorReply;
use techpulse_persist::PersistError;

/// API-facing error. Every variant renders as `{error, details?}`; raw
/// upstream detail goes into `details` and the log, never into `error`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Internal {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, error, None),
            ApiError::NotFound(error) => (StatusCode::NOT_FOUND, error, None),
            ApiError::Internal { error, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, details)
            }
        };

        if let Some(details) = &details {
            tracing::error!(%error, %details, status = %status, "request failed");
        }

        (status, Json(ErrorReply { error, details })).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Validation(message) => ApiError::BadRequest(message),
            ChatError::ThreadNotFound(id) => ApiError::NotFound(format!("Thread not found: {id}")),
            ChatError::Upstream(detail) => {
                ApiError::internal("Failed to process chat message", detail)
            }
            ChatError::Timeout(bound) => ApiError::internal(
                "Failed to process chat message",
                format!("model call exceeded {bound:?}"),
            ),
            ChatError::Persistence(e) => ApiError::from(e),
        }
    }
}

impl From<PersistError> for ApiError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::ThreadNotFound(id) => {
                ApiError::NotFound(format!("Thread not found: {id}"))
            }
            PersistError::InvalidObjectId(id) => {
                ApiError::BadRequest(format!("Invalid thread id: {id}"))
            }
            other => ApiError::internal("Database operation failed", other.to_string()),
        }
    }
}

impl From<AudioError> for ApiError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::Validation(message) => ApiError::BadRequest(message),
            other => ApiError::internal("Failed to transcribe audio", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let e = ApiError::from(ChatError::Validation("userId is required".to_string()));
        assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_thread_maps_to_404() {
        let e = ApiError::from(ChatError::ThreadNotFound("t1".to_string()));
        assert_eq!(e.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failure_maps_to_500() {
        let e = ApiError::from(ChatError::Upstream("boom".to_string()));
        assert_eq!(
            e.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

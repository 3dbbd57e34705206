use axum::http::StatusCode;
use axum::response::IntoResponse;

use techpulse_api::error::ApiError;
use techpulse_audio::AudioError;
use techpulse_chat::ChatError;

#[tokio::test]
async fn bad_request_renders_400() {
    let error = ApiError::BadRequest("userId is required".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn audio_validation_renders_400() {
    let error = ApiError::from(AudioError::Validation(
        "File size too large. Maximum size is 25MB".to_string(),
    ));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn audio_upstream_renders_500() {
    let error = ApiError::from(AudioError::Upstream {
        status: Some(502),
        message: "bad gateway".to_string(),
    });
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn chat_timeout_renders_500() {
    let error = ApiError::from(ChatError::Timeout(std::time::Duration::from_secs(60)));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

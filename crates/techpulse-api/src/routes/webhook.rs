use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use techpulse_client::webhook::RELAY_FALLBACK_TEXT;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    #[serde(rename = "type", default = "default_type")]
    pub webhook_type: String,
}

fn default_type() -> String {
    "default".to_string()
}

/// POST /api/webhook-proxy?type=... Forwards the payload to the outbound
/// URL configured for the type. Any failure collapses into the typed
/// fallback envelope: the caller always gets displayable text, never a
/// raw transport error.
pub async fn relay(
    State(state): State<AppState>,
    Query(query): Query<RelayQuery>,
    Json(payload): Json<Value>,
) -> Response {
    match relay_inner(&state, &query.webhook_type, &payload).await {
        Ok(result) => Json(result).into_response(),
        Err(details) => {
            tracing::error!(webhook_type = %query.webhook_type, %details, "webhook relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "response": RELAY_FALLBACK_TEXT,
                    "error": "Webhook proxy failed",
                    "details": details,
                })),
            )
                .into_response()
        }
    }
}

async fn relay_inner(state: &AppState, webhook_type: &str, payload: &Value) -> Result<Value, String> {
    let url = state
        .config
        .webhooks
        .get(webhook_type)
        .ok_or_else(|| format!("webhook URL not configured for type: {webhook_type}"))?;

    let response = state
        .relay
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("outbound webhook failed: {status} {body}"));
    }

    // Non-JSON replies are wrapped so every consumer sees one shape.
    let is_json = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        response.json().await.map_err(|e| e.to_string())
    } else {
        let text = response.text().await.map_err(|e| e.to_string())?;
        Ok(json!({ "response": text }))
    }
}

/// GET /api/webhook-proxy. Relay probe listing configured types.
pub async fn relay_info(State(state): State<AppState>) -> Json<Value> {
    let mut types: Vec<&String> = state.config.webhooks.keys().collect();
    types.sort();
    Json(json!({
        "message": "TechPulse Webhook Proxy",
        "status": "active",
        "availableTypes": types,
    }))
}

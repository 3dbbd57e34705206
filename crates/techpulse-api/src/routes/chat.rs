use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use techpulse_chat::TurnRequest;
use techpulse_client::wire::{
    AckReply, CreateThreadPayload, MessagesReply, SendMessagePayload, SendMessageReply,
    ThreadReply, ThreadsReply,
};
use techpulse_persist::{NewThread, ThreadMetadata, ThreadStore};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/chat/send. Runs one full turn through the orchestrator.
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<SendMessageReply>, ApiError> {
    let request = TurnRequest {
        user_id: payload.user_id,
        message: payload.message,
        thread_id: payload.thread_id,
        has_voice: payload.metadata.has_voice,
        attachments: payload.metadata.attachments,
    };

    let outcome = state.orchestrator.handle_turn(request).await?;

    Ok(Json(SendMessageReply {
        success: true,
        thread_id: outcome.thread_id,
        user_message: outcome.user_message,
        assistant_message: outcome.assistant_message,
        response: outcome.response,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListThreadsQuery {
    pub user_id: Option<String>,
}

/// GET /api/chat/threads?userId=...
pub async fn list_threads(
    State(state): State<AppState>,
    Query(query): Query<ListThreadsQuery>,
) -> Result<Json<ThreadsReply>, ApiError> {
    let user_id = require_user_id(query)?;
    let threads = state.store.list_threads(&user_id).await?;
    Ok(Json(ThreadsReply {
        success: true,
        threads,
    }))
}

/// POST /api/chat/threads. Creates an empty thread ahead of any turn.
pub async fn create_thread(
    State(state): State<AppState>,
    Json(payload): Json<CreateThreadPayload>,
) -> Result<Json<ThreadReply>, ApiError> {
    if payload.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let thread = state
        .store
        .create_thread(NewThread {
            user_id: payload.user_id.clone(),
            title: payload.title.unwrap_or_else(|| "New Chat".to_string()),
            content: payload.initial_message.unwrap_or_default(),
            // Manually created threads have no model response to score.
            confidence_score: 1.0,
            metadata: ThreadMetadata {
                source: Some("chat_interface".to_string()),
                user_id: Some(payload.user_id),
                tags: Vec::new(),
            },
        })
        .await?;

    Ok(Json(ThreadReply {
        success: true,
        thread,
    }))
}

/// Ownership gate shared by the per-thread handlers. A thread owned by
/// someone else reads the same as a missing one.
async fn ensure_owner(
    store: &dyn ThreadStore,
    thread_id: &str,
    user_id: &str,
) -> Result<(), ApiError> {
    match store.get_thread(thread_id).await? {
        Some(thread) if thread.user_id == user_id => Ok(()),
        _ => Err(ApiError::NotFound(format!("Thread not found: {thread_id}"))),
    }
}

fn require_user_id(query: ListThreadsQuery) -> Result<String, ApiError> {
    query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("userId is required".to_string()))
}

/// GET /api/chat/threads/:thread_id?userId=... The thread's messages in
/// order, only for the owner.
pub async fn get_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Query(query): Query<ListThreadsQuery>,
) -> Result<Json<MessagesReply>, ApiError> {
    let user_id = require_user_id(query)?;
    ensure_owner(state.store.as_ref(), &thread_id, &user_id).await?;

    let messages = state.store.list_messages(&thread_id).await?;
    Ok(Json(MessagesReply {
        success: true,
        messages,
    }))
}

/// DELETE /api/chat/threads/:thread_id?userId=... Only the owner may
/// delete; messages go first, then the thread.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Query(query): Query<ListThreadsQuery>,
) -> Result<Json<AckReply>, ApiError> {
    let user_id = require_user_id(query)?;
    ensure_owner(state.store.as_ref(), &thread_id, &user_id).await?;

    state.store.delete_thread(&thread_id).await?;
    tracing::info!(%thread_id, %user_id, "thread deleted");
    Ok(Json(AckReply { success: true }))
}

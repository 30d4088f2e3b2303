//! # Chat Handler
//!
//! The conversational endpoint. The answering agent never fails, so this
//! handler always returns a structured `ChatResponse`; degraded answers
//! show up as `success = false`, never as a raw error.

use super::AppState;
use crate::types::{ChatRequest, ChatResponse, ResponseStyle};
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// Handler for `POST /chat`.
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let style = ResponseStyle::resolve(payload.style.as_deref());
    // Sessions without a client-supplied id still get a stable handle in
    // the chat log.
    let session_id = payload
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(
        style = style.as_str(),
        "Received chat message: '{}'", payload.message
    );

    let result = app_state
        .agent
        .answer_user_query(
            payload.user_id.as_deref(),
            Some(&session_id),
            &payload.message,
            style.prompt_hint(),
            payload.context,
        )
        .await;

    let response_time_ms = result
        .metadata
        .get("processing_time_ms")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let error = result
        .metadata
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);

    Json(ChatResponse {
        response: result.answer_text,
        style: style.as_str().to_string(),
        intent: result.intent.as_str().to_string(),
        source: result.source.as_str().to_string(),
        success: result.success,
        response_time_ms,
        error,
    })
}

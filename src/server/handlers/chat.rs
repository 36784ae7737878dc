use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub session_id: String,
    pub message: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .chat
        .chat(&payload.session_id, &payload.message)
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/stream - `data: {"type": ...}` records until `done` or `error`.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state
        .chat
        .chat_stream(&payload.session_id, &payload.message)
        .await?;

    let stream = UnboundedReceiverStream::new(events).map(|event| Event::default().json_data(event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let turns = state.history.turns(&session_id).await?;
    Ok(Json(turns))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.history.clear(&session_id).await?;
    tracing::info!("Cleared {} turns from session {}", count, session_id);
    Ok(Json(json!({ "count": count })))
}

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{ChatRequest, LimitQuery};
use crate::error::AppResult;
use crate::models::chat::ChatMessage;
use crate::services::chat::ChatReply;
use crate::AppState;

const DEFAULT_HISTORY: i64 = 20;
const MAX_HISTORY: i64 = 100;

pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    body.validate()?;

    let reply = state
        .chat
        .respond(state.storage.as_ref(), auth_user.id, body.message.trim())
        .await?;
    Ok(Json(reply))
}

/// Most recent messages, oldest first.
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    let mut messages = state
        .storage
        .recent_chat_messages(auth_user.id, query.resolve(DEFAULT_HISTORY, MAX_HISTORY))
        .await?;
    messages.reverse();
    Ok(Json(messages))
}

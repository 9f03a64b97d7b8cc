pub mod affirmations;
pub mod auth;
pub mod chat;
pub mod habits;
pub mod health;
pub mod moods;

use chrono::FixedOffset;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// The offset that defines `user_id`'s calendar day.
pub(crate) async fn user_offset(state: &AppState, user_id: Uuid) -> AppResult<FixedOffset> {
    let user = state
        .storage
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(user.utc_offset())
}

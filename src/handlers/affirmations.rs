use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::AffirmationResponse;
use crate::error::AppResult;
use crate::handlers::user_offset;
use crate::services::affirmations::daily_affirmation;
use crate::services::calendar::CalendarDay;
use crate::AppState;

pub async fn daily(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<AffirmationResponse>> {
    let offset = user_offset(&state, auth_user.id).await?;
    let today = CalendarDay::of(Utc::now(), offset);

    Ok(Json(AffirmationResponse {
        affirmation: daily_affirmation(today),
        date: today,
    }))
}

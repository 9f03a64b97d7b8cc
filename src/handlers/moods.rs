use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{AnalyticsQuery, CreateMoodEntryRequest, LimitQuery};
use crate::error::AppResult;
use crate::handlers::user_offset;
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::services::analytics::{compute_analytics, MoodAnalytics};
use crate::services::calendar::DateWindow;
use crate::AppState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

pub async fn create_mood_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodEntryRequest>,
) -> AppResult<Json<MoodEntry>> {
    body.validate()?;

    let entry = state
        .storage
        .create_mood_entry(NewMoodEntry {
            user_id: auth_user.id,
            mood: body.mood,
            mood_score: body.mood_score.unwrap_or_else(|| body.mood.nominal_score()),
            journal_entry: body
                .journal_entry
                .map(|j| j.trim().to_string())
                .filter(|j| !j.is_empty()),
        })
        .await?;

    tracing::debug!(user_id = %auth_user.id, mood_score = entry.mood_score, "Mood entry recorded");
    Ok(Json(entry))
}

pub async fn list_mood_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = state
        .storage
        .list_mood_entries(auth_user.id, query.resolve(DEFAULT_LIMIT, MAX_LIMIT))
        .await?;
    Ok(Json(entries))
}

pub async fn mood_analytics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<MoodAnalytics>> {
    query.validate()?;

    let offset = user_offset(&state, auth_user.id).await?;
    let window = DateWindow::trailing_days(Utc::now(), query.days());
    let entries = state
        .storage
        .mood_entries_between(auth_user.id, window.start, window.end)
        .await?;

    Ok(Json(compute_analytics(entries, offset)))
}

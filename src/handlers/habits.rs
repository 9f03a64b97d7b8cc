use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{Duration, FixedOffset, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CompletionResponse, CreateHabitRequest, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::handlers::user_offset;
use crate::models::habit::{Habit, HabitWithStreak, NewHabit, StreakInfo};
use crate::services::calendar::CalendarDay;
use crate::services::streak::CompletionDays;
use crate::AppState;

/// Completion days inside the streak scan window ending with `today`.
async fn recent_completion_days(
    state: &AppState,
    user_id: Uuid,
    habit_id: Uuid,
    today: CalendarDay,
    offset: FixedOffset,
) -> AppResult<CompletionDays> {
    let (_, end) = today.bounds(offset);
    let start = end - Duration::days(i64::from(state.config.streak_scan_days));

    let completions = state
        .storage
        .completions_between(user_id, habit_id, start, end)
        .await?;

    Ok(CompletionDays::from_timestamps(
        completions.into_iter().map(|c| c.completed_at),
        offset,
    ))
}

async fn streak_info(
    state: &AppState,
    user_id: Uuid,
    habit_id: Uuid,
    offset: FixedOffset,
) -> AppResult<StreakInfo> {
    let today = CalendarDay::of(Utc::now(), offset);
    let days = recent_completion_days(state, user_id, habit_id, today, offset).await?;

    Ok(StreakInfo {
        habit_id,
        current_streak: days.streak(habit_id, today, state.config.streak_scan_days),
        completed_today: days.contains(today),
    })
}

async fn active_habit(state: &AppState, user_id: Uuid, habit_id: Uuid) -> AppResult<Habit> {
    state
        .storage
        .get_habit(user_id, habit_id)
        .await?
        .filter(|h| h.is_active)
        .ok_or_else(|| AppError::NotFound("Habit not found".into()))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateHabitRequest>,
) -> AppResult<Json<Habit>> {
    body.validate()?;

    let habit = state
        .storage
        .create_habit(NewHabit {
            user_id: auth_user.id,
            name: body.name.trim().to_string(),
            description: body
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
        .await?;

    tracing::debug!(user_id = %auth_user.id, habit_id = %habit.id, "Habit created");
    Ok(Json(habit))
}

pub async fn list_habits(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<HabitWithStreak>>> {
    let offset = user_offset(&state, auth_user.id).await?;
    let habits = state.storage.list_active_habits(auth_user.id).await?;

    let mut result = Vec::with_capacity(habits.len());
    for habit in habits {
        let info = streak_info(&state, auth_user.id, habit.id, offset).await?;
        result.push(HabitWithStreak {
            habit,
            streak: info.current_streak,
        });
    }

    Ok(Json(result))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !state.storage.deactivate_habit(auth_user.id, habit_id).await? {
        return Err(AppError::NotFound("Habit not found".into()));
    }

    tracing::debug!(user_id = %auth_user.id, habit_id = %habit_id, "Habit deactivated");
    Ok(Json(MessageResponse::new("Habit deleted")))
}

/// Records a completion for today. A second completion on the same local
/// day is rejected; the check and the insert are not atomic, so two
/// concurrent requests can both succeed. The streak ignores the extra row.
pub async fn complete_habit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<CompletionResponse>> {
    let habit = active_habit(&state, auth_user.id, habit_id).await?;
    let offset = user_offset(&state, auth_user.id).await?;

    let now = Utc::now();
    let (start, end) = CalendarDay::of(now, offset).bounds(offset);
    let today = state
        .storage
        .completions_between(auth_user.id, habit.id, start, end)
        .await?;

    if !today.is_empty() {
        return Err(AppError::Conflict("Habit already completed today".into()));
    }

    let completion = state
        .storage
        .create_completion(auth_user.id, habit.id, now)
        .await?;
    let info = streak_info(&state, auth_user.id, habit.id, offset).await?;

    tracing::debug!(
        user_id = %auth_user.id,
        habit_id = %habit.id,
        streak = info.current_streak,
        "Habit completed"
    );

    Ok(Json(CompletionResponse {
        completion,
        streak: info.current_streak,
    }))
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<StreakInfo>> {
    let habit = active_habit(&state, auth_user.id, habit_id).await?;
    let offset = user_offset(&state, auth_user.id).await?;

    Ok(Json(streak_info(&state, auth_user.id, habit.id, offset).await?))
}

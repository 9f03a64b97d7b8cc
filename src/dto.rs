//! Request and response bodies for the HTTP API.
//!
//! Conventions:
//! - `*Request` is deserialized from the JSON body, `*Query` from the query string
//! - Field rules are `validator` derives; handlers call `.validate()?` first
//! - List limits clamp instead of failing

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auth::jwt::TokenPair;
use crate::models::habit::HabitCompletion;
use crate::models::mood::MoodLabel;
use crate::models::user::UserProfile;
use crate::services::calendar::CalendarDay;

pub const MIN_UTC_OFFSET_MINUTES: i32 = -720;
pub const MAX_UTC_OFFSET_MINUTES: i32 = 840;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?limit=` for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn resolve(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    /// Minutes east of UTC. Default: 0
    #[validate(range(
        min = "MIN_UTC_OFFSET_MINUTES",
        max = "MAX_UTC_OFFSET_MINUTES",
        message = "utc_offset_minutes must be between -720 and 840"
    ))]
    pub utc_offset_minutes: Option<i32>,
}

impl RegisterRequest {
    pub fn utc_offset(&self) -> i32 {
        self.utc_offset_minutes.unwrap_or(0)
    }
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register, login and refresh all answer with a token pair and the profile.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

// ============================================================================
// Moods
// ============================================================================

/// POST /api/mood-entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodEntryRequest {
    pub mood: MoodLabel,

    /// Default: the label's nominal score
    #[validate(range(min = 1, max = 10, message = "Mood score must be 1-10"))]
    pub mood_score: Option<i32>,

    #[validate(length(max = 5000, message = "Journal entry must be under 5000 characters"))]
    pub journal_entry: Option<String>,
}

/// GET /api/mood-analytics
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AnalyticsQuery {
    #[validate(range(min = 1, max = 365, message = "days must be 1-365"))]
    pub days: Option<i64>,
}

impl AnalyticsQuery {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS)
    }
}

// ============================================================================
// Chat
// ============================================================================

/// POST /api/chat
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    #[validate(custom = "not_blank")]
    pub message: String,
}

// ============================================================================
// Habits
// ============================================================================

/// POST /api/habits
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHabitRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom = "not_blank")]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
}

/// POST /api/habits/:id/complete
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completion: HabitCompletion,
    pub streak: u32,
}

// ============================================================================
// Affirmations
// ============================================================================

/// GET /api/affirmations/daily
#[derive(Debug, Serialize)]
pub struct AffirmationResponse {
    pub affirmation: &'static str,
    pub date: CalendarDay,
}

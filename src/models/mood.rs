use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: MoodLabel,
    pub mood_score: i32,
    pub journal_entry: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "mood_label", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Amazing,
    Good,
    Okay,
    Down,
    Terrible,
}

impl MoodLabel {
    /// Score the client pairs with each label on the 1-10 scale.
    pub fn nominal_score(self) -> i32 {
        match self {
            Self::Amazing => 10,
            Self::Good => 8,
            Self::Okay => 6,
            Self::Down => 4,
            Self::Terrible => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub user_id: Uuid,
    pub mood: MoodLabel,
    pub mood_score: i32,
    pub journal_entry: Option<String>,
}

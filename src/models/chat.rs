use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_user: bool,
    pub sentiment: Option<Sentiment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "chat_sentiment", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// Tag for assistant replies produced on the regular path.
    Supportive,
    /// Tag for the fixed safety response.
    Crisis,
}

impl Sentiment {
    /// Maps a classifier label onto the stored sentiment. Unknown labels,
    /// including the `LABEL_n` style some models emit, become neutral.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "positive" | "label_2" => Self::Positive,
            "negative" | "label_0" => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub user_id: Uuid,
    pub message: String,
    pub is_user: bool,
    pub sentiment: Option<Sentiment>,
}

impl NewChatMessage {
    pub fn from_user(user_id: Uuid, message: impl Into<String>, sentiment: Option<Sentiment>) -> Self {
        Self {
            user_id,
            message: message.into(),
            is_user: true,
            sentiment,
        }
    }

    pub fn from_assistant(user_id: Uuid, message: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            user_id,
            message: message.into(),
            is_user: false,
            sentiment: Some(sentiment),
        }
    }
}

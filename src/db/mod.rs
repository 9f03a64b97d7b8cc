//! Persistence seam. Handlers and services only see [`Storage`]; the
//! PostgreSQL backend lives in [`postgres`].

mod pool;
pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::models::habit::{Habit, HabitCompletion, NewHabit};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::user::{NewUser, RefreshToken, User};

pub use pool::create_pool;
pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(test)]
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// True when a unique constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn ping(&self) -> StorageResult<()>;

    // Users
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    // Refresh tokens
    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StorageResult<Uuid>;
    async fn find_refresh_token(&self, token_hash: &str) -> StorageResult<Option<RefreshToken>>;
    async fn revoke_refresh_token(&self, id: Uuid) -> StorageResult<()>;
    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StorageResult<()>;

    // Mood entries
    async fn create_mood_entry(&self, entry: NewMoodEntry) -> StorageResult<MoodEntry>;
    /// Newest first.
    async fn list_mood_entries(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<MoodEntry>>;
    /// Oldest first, both bounds inclusive.
    async fn mood_entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<MoodEntry>>;

    // Chat
    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage>;
    /// Newest first.
    async fn recent_chat_messages(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<ChatMessage>>;

    // Habits
    async fn create_habit(&self, habit: NewHabit) -> StorageResult<Habit>;
    /// Active habits only, oldest first.
    async fn list_active_habits(&self, user_id: Uuid) -> StorageResult<Vec<Habit>>;
    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<Option<Habit>>;
    /// Returns false when no active habit matched.
    async fn deactivate_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<bool>;

    // Completions
    async fn create_completion(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<HabitCompletion>;
    /// Completions with `start <= completed_at < end`.
    async fn completions_between(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HabitCompletion>>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Storage, StorageResult};
use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::models::habit::{Habit, HabitCompletion, NewHabit};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::user::{NewUser, RefreshToken, User};

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn ping(&self) -> StorageResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, utc_offset_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.utc_offset_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StorageResult<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(parent_token_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StorageResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked, parent_token_id, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = false
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_mood_entry(&self, entry: NewMoodEntry) -> StorageResult<MoodEntry> {
        let entry = sqlx::query_as::<_, MoodEntry>(
            r#"
            INSERT INTO mood_entries (id, user_id, mood, mood_score, journal_entry)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.mood)
        .bind(entry.mood_score)
        .bind(&entry.journal_entry)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list_mood_entries(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(
            r#"
            SELECT * FROM mood_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn mood_entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(
            r#"
            SELECT * FROM mood_entries
            WHERE user_id = $1 AND created_at BETWEEN $2 AND $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (id, user_id, message, is_user, sentiment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.user_id)
        .bind(&message.message)
        .bind(message.is_user)
        .bind(message.sentiment)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn recent_chat_messages(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<ChatMessage>> {
        // Tie-break on insertion order: a user turn and its reply can share
        // a timestamp at microsecond precision.
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM chat_messages
            WHERE user_id = $1
            ORDER BY created_at DESC, is_user ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn create_habit(&self, habit: NewHabit) -> StorageResult<Habit> {
        let habit = sqlx::query_as::<_, Habit>(
            r#"
            INSERT INTO habits (id, user_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(habit.user_id)
        .bind(&habit.name)
        .bind(&habit.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(habit)
    }

    async fn list_active_habits(&self, user_id: Uuid) -> StorageResult<Vec<Habit>> {
        let habits = sqlx::query_as::<_, Habit>(
            r#"
            SELECT * FROM habits
            WHERE user_id = $1 AND is_active = true
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(habits)
    }

    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<Option<Habit>> {
        let habit = sqlx::query_as::<_, Habit>("SELECT * FROM habits WHERE id = $1 AND user_id = $2")
            .bind(habit_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(habit)
    }

    async fn deactivate_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE habits SET is_active = false WHERE id = $1 AND user_id = $2 AND is_active = true",
        )
        .bind(habit_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_completion(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<HabitCompletion> {
        let completion = sqlx::query_as::<_, HabitCompletion>(
            r#"
            INSERT INTO habit_completions (id, habit_id, user_id, completed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(habit_id)
        .bind(user_id)
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(completion)
    }

    async fn completions_between(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HabitCompletion>> {
        let completions = sqlx::query_as::<_, HabitCompletion>(
            r#"
            SELECT * FROM habit_completions
            WHERE user_id = $1 AND habit_id = $2
              AND completed_at >= $3 AND completed_at < $4
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(completions)
    }
}

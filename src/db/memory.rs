//! In-process [`Storage`] used by unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Storage, StorageError, StorageResult};
use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::models::habit::{Habit, HabitCompletion, NewHabit};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::user::{NewUser, RefreshToken, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    mood_entries: Vec<MoodEntry>,
    chat_messages: Vec<ChatMessage>,
    habits: Vec<Habit>,
    completions: Vec<HabitCompletion>,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> StorageResult<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage poisoned".into()))?;
        Ok(f(&mut tables))
    }

    /// Inserts a mood entry with an explicit timestamp.
    pub fn insert_mood_entry_at(&self, entry: NewMoodEntry, created_at: DateTime<Utc>) -> MoodEntry {
        let entry = MoodEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            mood: entry.mood,
            mood_score: entry.mood_score,
            journal_entry: entry.journal_entry,
            created_at,
        };
        self.tables.lock().unwrap().mood_entries.push(entry.clone());
        entry
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.tables.lock().unwrap().chat_messages.clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        self.with(|_| ())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        self.with(|t| {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                email: user.email,
                password_hash: user.password_hash,
                first_name: user.first_name,
                last_name: user.last_name,
                utc_offset_minutes: user.utc_offset_minutes,
                created_at: now,
                updated_at: now,
            };
            t.users.push(user.clone());
            user
        })
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StorageResult<Uuid> {
        self.with(|t| {
            let id = Uuid::new_v4();
            t.refresh_tokens.push(RefreshToken {
                id,
                user_id,
                token_hash: token_hash.to_string(),
                expires_at,
                revoked: false,
                parent_token_id,
                created_at: Utc::now(),
            });
            id
        })
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StorageResult<Option<RefreshToken>> {
        self.with(|t| {
            t.refresh_tokens
                .iter()
                .find(|r| r.token_hash == token_hash)
                .cloned()
        })
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StorageResult<()> {
        self.with(|t| {
            if let Some(token) = t.refresh_tokens.iter_mut().find(|r| r.id == id) {
                token.revoked = true;
            }
        })
    }

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StorageResult<()> {
        self.with(|t| {
            t.refresh_tokens
                .iter_mut()
                .filter(|r| r.user_id == user_id)
                .for_each(|r| r.revoked = true);
        })
    }

    async fn create_mood_entry(&self, entry: NewMoodEntry) -> StorageResult<MoodEntry> {
        Ok(self.insert_mood_entry_at(entry, Utc::now()))
    }

    async fn list_mood_entries(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<MoodEntry>> {
        self.with(|t| {
            let mut entries: Vec<MoodEntry> = t
                .mood_entries
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            entries.truncate(limit.max(0) as usize);
            entries
        })
    }

    async fn mood_entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<MoodEntry>> {
        self.with(|t| {
            let mut entries: Vec<MoodEntry> = t
                .mood_entries
                .iter()
                .filter(|e| e.user_id == user_id && e.created_at >= start && e.created_at <= end)
                .cloned()
                .collect();
            entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            entries
        })
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        self.with(|t| {
            let message = ChatMessage {
                id: Uuid::new_v4(),
                user_id: message.user_id,
                message: message.message,
                is_user: message.is_user,
                sentiment: message.sentiment,
                created_at: Utc::now(),
            };
            t.chat_messages.push(message.clone());
            message
        })
    }

    async fn recent_chat_messages(&self, user_id: Uuid, limit: i64) -> StorageResult<Vec<ChatMessage>> {
        // Insertion order is conversation order.
        self.with(|t| {
            t.chat_messages
                .iter()
                .rev()
                .filter(|m| m.user_id == user_id)
                .take(limit.max(0) as usize)
                .cloned()
                .collect()
        })
    }

    async fn create_habit(&self, habit: NewHabit) -> StorageResult<Habit> {
        self.with(|t| {
            let habit = Habit {
                id: Uuid::new_v4(),
                user_id: habit.user_id,
                name: habit.name,
                description: habit.description,
                is_active: true,
                created_at: Utc::now(),
            };
            t.habits.push(habit.clone());
            habit
        })
    }

    async fn list_active_habits(&self, user_id: Uuid) -> StorageResult<Vec<Habit>> {
        self.with(|t| {
            t.habits
                .iter()
                .filter(|h| h.user_id == user_id && h.is_active)
                .cloned()
                .collect()
        })
    }

    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<Option<Habit>> {
        self.with(|t| {
            t.habits
                .iter()
                .find(|h| h.id == habit_id && h.user_id == user_id)
                .cloned()
        })
    }

    async fn deactivate_habit(&self, user_id: Uuid, habit_id: Uuid) -> StorageResult<bool> {
        self.with(|t| {
            match t
                .habits
                .iter_mut()
                .find(|h| h.id == habit_id && h.user_id == user_id && h.is_active)
            {
                Some(habit) => {
                    habit.is_active = false;
                    true
                }
                None => false,
            }
        })
    }

    async fn create_completion(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<HabitCompletion> {
        self.with(|t| {
            let completion = HabitCompletion {
                id: Uuid::new_v4(),
                habit_id,
                user_id,
                completed_at,
            };
            t.completions.push(completion.clone());
            completion
        })
    }

    async fn completions_between(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HabitCompletion>> {
        self.with(|t| {
            let mut completions: Vec<HabitCompletion> = t
                .completions
                .iter()
                .filter(|c| {
                    c.user_id == user_id
                        && c.habit_id == habit_id
                        && c.completed_at >= start
                        && c.completed_at < end
                })
                .cloned()
                .collect();
            completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            completions
        })
    }
}

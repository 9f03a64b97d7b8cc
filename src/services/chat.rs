//! One chat turn: safety gate, sentiment, persistence, reply.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Storage, StorageResult};
use crate::models::chat::{NewChatMessage, Sentiment};
use crate::services::inference::{InferenceService, SentimentAnalysis};
use crate::services::safety::{self, CRISIS_RESPONSE};

/// Number of prior messages passed to the model as context.
pub const CONTEXT_MESSAGES: i64 = 5;

pub type SharedRng = Arc<Mutex<Box<dyn RngCore + Send>>>;

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentAnalysis>,
    pub is_crisis: bool,
}

#[derive(Clone)]
pub struct ChatService {
    inference: Arc<dyn InferenceService>,
    rng: SharedRng,
}

impl ChatService {
    pub fn new(inference: Arc<dyn InferenceService>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            inference,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn with_entropy(inference: Arc<dyn InferenceService>) -> Self {
        Self::new(inference, Box::new(StdRng::from_entropy()))
    }

    /// Handles one user message and returns the assistant's reply. Inference
    /// failures are absorbed here; only storage errors propagate.
    pub async fn respond(
        &self,
        storage: &dyn Storage,
        user_id: Uuid,
        message: &str,
    ) -> StorageResult<ChatReply> {
        if safety::classify(message).is_crisis {
            tracing::warn!(user_id = %user_id, "Crisis phrase detected, sending safety resources");

            storage
                .create_chat_message(NewChatMessage::from_user(user_id, message, None))
                .await?;
            storage
                .create_chat_message(NewChatMessage::from_assistant(
                    user_id,
                    CRISIS_RESPONSE,
                    Sentiment::Crisis,
                ))
                .await?;

            return Ok(ChatReply {
                message: CRISIS_RESPONSE.to_string(),
                sentiment: None,
                is_crisis: true,
            });
        }

        let sentiment = match self.inference.analyze_sentiment(message).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "Sentiment analysis failed, defaulting to neutral");
                SentimentAnalysis::neutral()
            }
        };

        let context = self.context(storage, user_id).await?;

        storage
            .create_chat_message(NewChatMessage::from_user(
                user_id,
                message,
                Some(sentiment.sentiment),
            ))
            .await?;

        let reply = match self.inference.generate_reply(message, &context).await {
            Ok(text) => {
                let mut rng = self.lock_rng();
                safety::add_empathy(&text, message, &mut **rng)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reply generation failed, using fallback reply");
                let mut rng = self.lock_rng();
                safety::fallback_reply(message, &mut **rng)
            }
        };

        storage
            .create_chat_message(NewChatMessage::from_assistant(
                user_id,
                reply.clone(),
                Sentiment::Supportive,
            ))
            .await?;

        Ok(ChatReply {
            message: reply,
            sentiment: Some(sentiment),
            is_crisis: false,
        })
    }

    /// Most recent turns, oldest first, one `Speaker: text` line each.
    async fn context(&self, storage: &dyn Storage, user_id: Uuid) -> StorageResult<String> {
        let recent = storage.recent_chat_messages(user_id, CONTEXT_MESSAGES).await?;

        Ok(recent
            .iter()
            .rev()
            .map(|m| {
                let speaker = if m.is_user { "User" } else { "Assistant" };
                format!("{speaker}: {}", m.message)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn lock_rng(&self) -> MutexGuard<'_, Box<dyn RngCore + Send>> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Text-inference collaborator: reply generation and sentiment analysis.
//!
//! The rest of the crate talks to [`InferenceService`]. The production
//! implementation is [`HuggingFaceClient`], built once at startup and shared
//! through `AppState`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::chat::Sentiment;

/// Returned when the model produced no usable text.
pub const DEFAULT_REPLY: &str = "I'm here to listen and support you.";

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference unavailable: {0}")]
    Unavailable(String),

    #[error("inference transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("inference model error: {0}")]
    Model(String),

    #[error("unexpected inference response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub confidence: f64,
}

impl SentimentAnalysis {
    /// Used when classification fails.
    pub fn neutral() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
        }
    }
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Generates an assistant reply to `message`, given prior turns in
    /// `User: …` / `Assistant: …` form (may be empty).
    async fn generate_reply(&self, message: &str, context: &str) -> Result<String, InferenceError>;

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, InferenceError>;
}

#[derive(Debug, Clone)]
pub struct HuggingFaceSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub sentiment_model: String,
    pub timeout_secs: u64,
}

pub struct HuggingFaceClient {
    http: reqwest::Client,
    settings: HuggingFaceSettings,
}

impl HuggingFaceClient {
    pub fn new(settings: HuggingFaceSettings) -> Result<Self, InferenceError> {
        if settings.api_key.is_none() {
            tracing::warn!("Hugging Face API key not set; chat replies will use fallbacks");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { http, settings })
    }

    async fn post_model(&self, model: &str, payload: Value) -> Result<Value, InferenceError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| InferenceError::Unavailable("Hugging Face API key not configured".into()))?;

        let url = format!("{}/{}", self.settings.api_url.trim_end_matches('/'), model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let value: Value = response.json().await?;
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(InferenceError::Model(error.to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl InferenceService for HuggingFaceClient {
    async fn generate_reply(&self, message: &str, context: &str) -> Result<String, InferenceError> {
        let payload = json!({
            "inputs": build_prompt(message, context),
            "parameters": {
                "max_length": 150,
                "temperature": 0.7,
                "do_sample": true,
                "pad_token_id": 50256,
            }
        });

        let value = self.post_model(&self.settings.chat_model, payload).await?;
        let generated = value
            .get(0)
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REPLY);

        Ok(extract_reply(generated))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, InferenceError> {
        let value = self
            .post_model(&self.settings.sentiment_model, json!({ "inputs": text }))
            .await?;

        let payload: SentimentPayload = serde_json::from_value(value)
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        payload
            .top_label()
            .map(|top| SentimentAnalysis {
                sentiment: Sentiment::from_label(&top.label),
                confidence: top.score,
            })
            .ok_or_else(|| InferenceError::Malformed("empty sentiment response".into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Classification endpoints answer with either one list of labels or a
/// list per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentimentPayload {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl SentimentPayload {
    fn top_label(self) -> Option<LabelScore> {
        let labels = match self {
            SentimentPayload::Nested(mut batches) => {
                if batches.is_empty() {
                    return None;
                }
                batches.swap_remove(0)
            }
            SentimentPayload::Flat(labels) => labels,
        };
        labels
            .into_iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
    }
}

pub fn build_prompt(message: &str, context: &str) -> String {
    if context.is_empty() {
        format!("User: {message}\nAssistant:")
    } else {
        format!("{context}\nUser: {message}\nAssistant:")
    }
}

/// Keeps only the text after the last `Assistant:` marker, since
/// conversational models echo the prompt back.
pub fn extract_reply(generated: &str) -> String {
    match generated.rsplit_once("Assistant:") {
        Some((_, tail)) if !tail.trim().is_empty() => tail.trim().to_string(),
        _ => generated.to_string(),
    }
}

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};

use crate::services::inference::HuggingFaceSettings;
use crate::services::streak::DEFAULT_SCAN_DAYS;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    pub hf_api_key: Option<String>,
    pub hf_api_url: String,
    pub hf_chat_model: String,
    pub hf_sentiment_model: String,
    pub inference_timeout_secs: u64,

    pub streak_scan_days: u32,
    pub chat_rate_limit_per_min: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set"));

        let streak_scan_days: u32 =
            parse_or("STREAK_SCAN_DAYS", get("STREAK_SCAN_DAYS"), &DEFAULT_SCAN_DAYS.to_string())?;
        if streak_scan_days == 0 {
            anyhow::bail!("STREAK_SCAN_DAYS must be at least 1");
        }

        let chat_rate_limit_per_min: u32 =
            parse_or("CHAT_RATE_LIMIT_PER_MIN", get("CHAT_RATE_LIMIT_PER_MIN"), "20")?;
        if chat_rate_limit_per_min == 0 {
            anyhow::bail!("CHAT_RATE_LIMIT_PER_MIN must be at least 1");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or("PORT", get("PORT"), "8080")?,
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            cors_extra_origins: get("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: required("JWT_SECRET")?,
            jwt_access_ttl_secs: parse_or("JWT_ACCESS_TTL_SECS", get("JWT_ACCESS_TTL_SECS"), "900")?,
            jwt_refresh_ttl_secs: parse_or("JWT_REFRESH_TTL_SECS", get("JWT_REFRESH_TTL_SECS"), "604800")?,

            hf_api_key: get("HUGGING_FACE_API_KEY").or_else(|| get("HF_TOKEN")),
            hf_api_url: get("HF_API_URL")
                .unwrap_or_else(|| "https://api-inference.huggingface.co/models".into()),
            hf_chat_model: get("HF_CHAT_MODEL").unwrap_or_else(|| "microsoft/DialoGPT-medium".into()),
            hf_sentiment_model: get("HF_SENTIMENT_MODEL")
                .unwrap_or_else(|| "cardiffnlp/twitter-roberta-base-sentiment-latest".into()),
            inference_timeout_secs: parse_or("INFERENCE_TIMEOUT_SECS", get("INFERENCE_TIMEOUT_SECS"), "30")?,

            streak_scan_days,
            chat_rate_limit_per_min,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn huggingface(&self) -> HuggingFaceSettings {
        HuggingFaceSettings {
            api_url: self.hf_api_url.clone(),
            api_key: self.hf_api_key.clone(),
            chat_model: self.hf_chat_model.clone(),
            sentiment_model: self.hf_sentiment_model.clone(),
            timeout_secs: self.inference_timeout_secs,
        }
    }
}

#[cfg(test)]
impl Config {
    /// Defaults plus a fixed secret; inference has no API key.
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/serenity_test".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .expect("test config")
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value.as_deref().unwrap_or(default);
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a number, got {raw:?}"))
}

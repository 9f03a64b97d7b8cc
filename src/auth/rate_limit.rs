use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// Auth endpoints: requests per IP and path per window.
const MAX_AUTH_REQUESTS: u32 = 5;
const WINDOW_SECS: u64 = 60;

/// Fixed-window counters keyed by caller. Single-instance only.
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ok(remaining) when allowed, Err(retry_after) when limited.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        self.check_with_limits(key, MAX_AUTH_REQUESTS, WINDOW_SECS).await
    }

    pub async fn check_with_limits(
        &self,
        key: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            return Err(window.saturating_sub(now.duration_since(entry.window_start)));
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }

    /// Drops entries whose window ended long ago and returns how many went.
    pub async fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let keep_for = Duration::from_secs(WINDOW_SECS * 2);
        let before = entries.len();

        entries.retain(|_, entry| now.duration_since(entry.window_start) < keep_for);
        before - entries.len()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

pub fn spawn_cleanup_worker(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300)); // 5 min
        loop {
            interval.tick().await;
            let purged = limiter.cleanup().await;
            if purged > 0 {
                tracing::debug!(purged, "Rate limiter cleanup: purged stale entries");
            }
        }
    });
}

/// Per IP and path, so /login and /register are counted separately.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

/// Per authenticated user. Must sit inside `require_auth`.
pub async fn rate_limit_chat(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id)
        .ok_or(AppError::Unauthorized)?;
    let key = format!("chat:{}", user_id);

    match state
        .rate_limiter
        .check_with_limits(&key, state.config.chat_rate_limit_per_min, WINDOW_SECS)
        .await
    {
        Ok(remaining) => {
            tracing::debug!(user_id = %user_id, remaining, "Chat rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                user_id = %user_id,
                retry_after_secs = retry_after.as_secs(),
                "Chat rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit_allows_under_limit() {
        let limiter = RateLimitState::new();

        for i in 0..MAX_AUTH_REQUESTS {
            let result = limiter.check("test_key").await;
            assert_eq!(result, Ok(MAX_AUTH_REQUESTS - i - 1), "request {} should pass", i + 1);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_over_limit() {
        let limiter = RateLimitState::new();

        for _ in 0..MAX_AUTH_REQUESTS {
            let _ = limiter.check("test_key").await;
        }

        let retry_after = limiter.check("test_key").await.unwrap_err();
        assert!(retry_after <= Duration::from_secs(WINDOW_SECS));
    }

    #[tokio::test]
    async fn test_different_keys_have_separate_limits() {
        let limiter = RateLimitState::new();

        for _ in 0..MAX_AUTH_REQUESTS {
            let _ = limiter.check("key1").await;
        }

        assert!(limiter.check("key2").await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_limits() {
        let limiter = RateLimitState::new();
        assert_eq!(limiter.check_with_limits("chat:u", 2, 60).await, Ok(1));
        assert_eq!(limiter.check_with_limits("chat:u", 2, 60).await, Ok(0));
        assert!(limiter.check_with_limits("chat:u", 2, 60).await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_entries() {
        let limiter = RateLimitState::new();
        let _ = limiter.check("fresh").await;
        assert_eq!(limiter.cleanup().await, 0);
        assert_eq!(limiter.len().await, 1);
    }
}

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{middleware::require_auth, rate_limit};
use crate::config::Config;
use crate::handlers;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    // Layered before require_auth is applied below, so it runs after it.
    let chat_routes = Router::new()
        .route("/api/chat", post(handlers::chat::send_message))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_chat,
        ));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/user", get(handlers::auth::me))
        // Moods
        .route(
            "/api/mood-entries",
            post(handlers::moods::create_mood_entry).get(handlers::moods::list_mood_entries),
        )
        .route("/api/mood-analytics", get(handlers::moods::mood_analytics))
        // Chat
        .route("/api/chat/history", get(handlers::chat::chat_history))
        .merge(chat_routes)
        // Habits
        .route(
            "/api/habits",
            post(handlers::habits::create_habit).get(handlers::habits::list_habits),
        )
        .route("/api/habits/:id", delete(handlers::habits::delete_habit))
        .route("/api/habits/:id/complete", post(handlers::habits::complete_habit))
        .route("/api/habits/:id/streak", get(handlers::habits::get_streak))
        // Affirmations
        .route("/api/affirmations/daily", get(handlers::affirmations::daily))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use rand::rngs::mock::StepRng;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::rate_limit::RateLimitState;
    use crate::db::memory::MemoryStorage;
    use crate::services::chat::ChatService;
    use crate::services::inference::HuggingFaceClient;
    use crate::services::safety::{CRISIS_RESPONSE, GENERIC_FALLBACKS};

    /// Router over in-memory storage. Inference has no API key, so chat
    /// replies always come from the fallback pool.
    fn test_app_with(config: Config) -> Router {
        let inference = HuggingFaceClient::new(config.huggingface()).unwrap();
        let state = AppState {
            storage: Arc::new(MemoryStorage::new()),
            config: Arc::new(config),
            chat: ChatService::new(Arc::new(inference), Box::new(StepRng::new(0, 0))),
            rate_limiter: RateLimitState::new(),
        };
        build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    fn test_app() -> Router {
        test_app_with(Config::for_tests())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(app: &Router, email: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "correct-horse", "first_name": "Sam" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn access_token(app: &Router, email: &str) -> String {
        register(app, email).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, Method::GET, "/readyz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "ok");
    }

    #[tokio::test]
    async fn test_protected_route_requires_bearer_token() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/api/habits", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 401);

        let (status, _) = send(&app, Method::GET, "/api/habits", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_and_profile() {
        let app = test_app();
        let registered = register(&app, "Sam@Example.com").await;
        assert_eq!(registered["user"]["email"], "sam@example.com");
        assert!(registered["user"].get("password_hash").is_none());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "sam@example.com", "password": "another-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "sam@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, login) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "sam@example.com", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let token = login["access_token"].as_str().unwrap();
        let (status, me) = send(&app, Method::GET, "/api/auth/user", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["first_name"], "Sam");
        assert_eq!(me["utc_offset_minutes"], 0);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "sam@example.com", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], 422);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "sam@example.com",
                "password": "correct-horse",
                "utc_offset_minutes": 900
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_reuse_detection() {
        let app = test_app();
        let registered = register(&app, "sam@example.com").await;
        let first = registered["refresh_token"].as_str().unwrap().to_string();

        let (status, rotated) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = rotated["refresh_token"].as_str().unwrap().to_string();

        // Replaying the rotated-out token revokes the whole family.
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": second })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": token })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_tokens() {
        let app = test_app();
        let registered = register(&app, "sam@example.com").await;
        let access = registered["access_token"].as_str().unwrap();
        let refresh = registered["refresh_token"].as_str().unwrap();

        let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(access), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_routes_are_rate_limited() {
        let app = test_app();
        let attempt = json!({ "email": "nobody@example.com", "password": "whatever1" });

        for _ in 0..5 {
            let (status, _) =
                send(&app, Method::POST, "/api/auth/login", None, Some(attempt.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, body) =
            send(&app, Method::POST, "/api/auth/login", None, Some(attempt)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], 429);
    }

    #[tokio::test]
    async fn test_mood_entries_and_analytics() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;

        for (mood, score) in [("down", 3), ("okay", 5), ("good", 7)] {
            let (status, entry) = send(
                &app,
                Method::POST,
                "/api/mood-entries",
                Some(&token),
                Some(json!({ "mood": mood, "mood_score": score, "journal_entry": "  " })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(entry["journal_entry"].is_null());
        }

        let (status, entry) = send(
            &app,
            Method::POST,
            "/api/mood-entries",
            Some(&token),
            Some(json!({ "mood": "amazing" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["mood_score"], 10);

        let (status, listed) =
            send(&app, Method::GET, "/api/mood-entries?limit=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let (status, analytics) =
            send(&app, Method::GET, "/api/mood-analytics", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(analytics["total_entries"], 4);
        assert_eq!(analytics["average_mood"], 6.25);
        assert_eq!(analytics["mood_trend"], "improving");
        assert!(analytics["best_day"].is_string());
    }

    #[tokio::test]
    async fn test_mood_validation_and_empty_analytics() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/mood-entries",
            Some(&token),
            Some(json!({ "mood": "good", "mood_score": 11 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) =
            send(&app, Method::GET, "/api/mood-analytics?days=0", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, analytics) =
            send(&app, Method::GET, "/api/mood-analytics?days=30", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(analytics["total_entries"], 0);
        assert_eq!(analytics["average_mood"], 0.0);
        assert_eq!(analytics["mood_trend"], "neutral");
        assert!(analytics["best_day"].is_null());
    }

    #[tokio::test]
    async fn test_habit_lifecycle() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;

        let (status, habit) = send(
            &app,
            Method::POST,
            "/api/habits",
            Some(&token),
            Some(json!({ "name": " Meditate ", "description": "Ten minutes" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["name"], "Meditate");
        let id = habit["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/habits",
            Some(&token),
            Some(json!({ "name": "x".repeat(101) })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, streak) =
            send(&app, Method::GET, &format!("/api/habits/{id}/streak"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(streak["current_streak"], 0);
        assert_eq!(streak["completed_today"], false);

        let (status, done) =
            send(&app, Method::POST, &format!("/api/habits/{id}/complete"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["streak"], 1);

        let (status, body) =
            send(&app, Method::POST, &format!("/api/habits/{id}/complete"), Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409);

        let (status, habits) = send(&app, Method::GET, "/api/habits", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habits[0]["streak"], 1);
        assert_eq!(habits[0]["name"], "Meditate");

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/habits/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, habits) = send(&app, Method::GET, "/api/habits", Some(&token), None).await;
        assert!(habits.as_array().unwrap().is_empty());

        let (status, _) =
            send(&app, Method::POST, &format!("/api/habits/{id}/complete"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/habits/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_habits_are_scoped_to_owner() {
        let app = test_app();
        let owner = access_token(&app, "owner@example.com").await;
        let other = access_token(&app, "other@example.com").await;

        let (_, habit) = send(
            &app,
            Method::POST,
            "/api/habits",
            Some(&owner),
            Some(json!({ "name": "Journal" })),
        )
        .await;
        let id = habit["id"].as_str().unwrap();

        let (status, _) =
            send(&app, Method::POST, &format!("/api/habits/{id}/complete"), Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, Method::GET, &format!("/api/habits/{id}/streak"), Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_crisis_and_history() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;

        let (status, reply) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({ "message": "I feel hopeless" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["is_crisis"], true);
        assert_eq!(reply["message"], CRISIS_RESPONSE);

        let (status, reply) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({ "message": "Tell me something" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["is_crisis"], false);
        assert_eq!(reply["message"], GENERIC_FALLBACKS[0]);
        assert_eq!(reply["sentiment"]["sentiment"], "neutral");

        let (status, history) =
            send(&app, Method::GET, "/api/chat/history", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0]["message"], "I feel hopeless");
        assert_eq!(history[1]["sentiment"], "crisis");
        assert_eq!(history[3]["sentiment"], "supportive");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_chat_is_rate_limited_per_user() {
        let mut config = Config::for_tests();
        config.chat_rate_limit_per_min = 2;
        let app = test_app_with(config);
        let token = access_token(&app, "sam@example.com").await;
        let other = access_token(&app, "other@example.com").await;
        let message = json!({ "message": "hello" });

        for _ in 0..2 {
            let (status, _) =
                send(&app, Method::POST, "/api/chat", Some(&token), Some(message.clone())).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) =
            send(&app, Method::POST, "/api/chat", Some(&token), Some(message.clone())).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) = send(&app, Method::POST, "/api/chat", Some(&other), Some(message)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_daily_affirmation() {
        let app = test_app();
        let token = access_token(&app, "sam@example.com").await;

        let (status, body) =
            send(&app, Method::GET, "/api/affirmations/daily", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let affirmation = body["affirmation"].as_str().unwrap();
        assert!(crate::services::affirmations::AFFIRMATIONS.contains(&affirmation));
        assert!(body["date"].is_string());
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use serenity_api::auth::rate_limit::{self, RateLimitState};
use serenity_api::config::Config;
use serenity_api::db::{self, PgStorage};
use serenity_api::routes::build_router;
use serenity_api::services::chat::ChatService;
use serenity_api::services::inference::HuggingFaceClient;
use serenity_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "serenity_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env().context("Invalid configuration")?);

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");

    let inference = HuggingFaceClient::new(config.huggingface())
        .context("Failed to build inference client")?;

    let state = AppState {
        storage: Arc::new(PgStorage::new(pool)),
        config: config.clone(),
        chat: ChatService::with_entropy(Arc::new(inference)),
        rate_limiter: RateLimitState::new(),
    };

    rate_limit::spawn_cleanup_worker(state.rate_limiter.clone());

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    // Client IP feeds the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

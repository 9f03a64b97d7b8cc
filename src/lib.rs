use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::Storage;
use services::chat::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<Config>,
    pub chat: ChatService,
    pub rate_limiter: RateLimitState,
}

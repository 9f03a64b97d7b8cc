use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::dto::{AuthResponse, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, User, UserProfile};
use crate::AppState;

/// Signs a token pair and persists the refresh token hash, optionally
/// linked to the token it replaces.
async fn issue_token_pair(
    state: &AppState,
    user: &User,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user.id, &user.email, &state.config)?;
    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_ttl_secs);

    state
        .storage
        .store_refresh_token(
            user.id,
            &hash_token(&tokens.refresh_token),
            expires_at,
            parent_token_id,
        )
        .await?;

    Ok(tokens)
}

async fn auth_response(state: &AppState, user: User, parent_token_id: Option<Uuid>) -> AppResult<Json<AuthResponse>> {
    let tokens = issue_token_pair(state, &user, parent_token_id).await?;
    Ok(Json(AuthResponse {
        tokens,
        user: user.into(),
    }))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trimmed_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;
    let utc_offset_minutes = body.utc_offset();
    let email = normalize_email(&body.email);

    if state.storage.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let new_user = NewUser {
        email,
        password_hash: hash_password(&body.password)?,
        first_name: trimmed_name(body.first_name),
        last_name: trimmed_name(body.last_name),
        utc_offset_minutes,
    };

    let user = match state.storage.create_user(new_user).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration.
        Err(e) if e.is_unique_violation() => {
            return Err(AppError::Conflict("Email already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "User registered");
    auth_response(&state, user, None).await
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;

    let user = state
        .storage
        .find_user_by_email(&normalize_email(&body.email))
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(AppError::Unauthorized);
    }

    auth_response(&state, user, None).await
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_data = verify_token(&body.refresh_token, &state.config)?;

    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let stored = state
        .storage
        .find_refresh_token(&hash_token(&body.refresh_token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    // A revoked token coming back means it leaked; kill the whole family.
    if stored.revoked {
        tracing::warn!(
            user_id = %stored.user_id,
            token_id = %stored.id,
            "Refresh token reuse detected, revoking all tokens for user"
        );
        state.storage.revoke_all_refresh_tokens(stored.user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored.user_id != token_data.claims.sub || stored.expires_at <= Utc::now() {
        return Err(AppError::Unauthorized);
    }

    state.storage.revoke_refresh_token(stored.id).await?;

    let user = state
        .storage
        .get_user(stored.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    auth_response(&state, user, Some(stored.id)).await
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    state.storage.revoke_all_refresh_tokens(auth_user.id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = state
        .storage
        .get_user(auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

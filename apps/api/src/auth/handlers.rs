//! Axum route handlers for account registration, sign-in and password changes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::credentials::{
    check_password_policy, hash_password, password_strength, require_email, verify_password,
    PasswordStrength,
};
use crate::auth::session::{create_session, revoke_session, revoke_user_sessions};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{PublicUser, UserRow};
use crate::state::AppState;
use crate::users::preferences::Preferences;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordStrengthRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let email = require_email(&req.email)?;
    check_password_policy(&req.password)?;
    let full_name = req
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let password_hash = hash_password(&req.password)?;
    let preferences = serde_json::to_value(Preferences::default())
        .map_err(|e| AppError::Internal(e.into()))?;

    let inserted = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, preferences)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&full_name)
    .bind(&password_hash)
    .bind(&preferences)
    .fetch_optional(&state.db)
    .await?;

    let user = inserted.ok_or_else(|| AppError::Conflict("Email already registered".to_string()))?;
    info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = crate::auth::credentials::normalize_email(&req.email).ok_or_else(invalid)?;
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }

    let session = create_session(&state.db, user.id, state.config.session_ttl_minutes).await?;
    info!("User {} signed in", user.id);

    Ok(Json(LoginResponse {
        access_token: session.token,
        token_type: "bearer",
        expires_in: (session.expires_at - Utc::now()).num_seconds().max(0),
        user: user.into(),
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    revoke_session(&state.db, &auth.token_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/change-password
///
/// Keeps the caller's session; every other session of the user is revoked.
pub async fn handle_change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !verify_password(&req.current_password, &auth.user.password_hash) {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    check_password_policy(&req.new_password)?;
    let password_hash = hash_password(&req.new_password)?;

    let mut tx = state.db.begin().await?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&password_hash)
        .bind(auth.id())
        .execute(&mut *tx)
        .await?;
    let revoked = revoke_user_sessions(&mut *tx, auth.id(), Some(&auth.token_hash)).await?;
    tx.commit().await?;

    info!("User {} changed password, revoked {revoked} other sessions", auth.id());
    Ok(Json(MessageResponse {
        message: "Password changed successfully.".to_string(),
    }))
}

/// POST /api/v1/auth/password-strength
pub async fn handle_password_strength(
    Json(req): Json<PasswordStrengthRequest>,
) -> Json<PasswordStrength> {
    Json(password_strength(&req.password))
}

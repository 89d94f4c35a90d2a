//! Axum route handlers for the reset-code flow.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::credentials::{check_password_policy, hash_password, require_email};
use crate::auth::session::revoke_user_sessions;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::password_reset::code::normalize_code;
use crate::password_reset::store::{check_code, issue_code, CodeCheck};
use crate::state::AppState;
use crate::throttle::ThrottleRule;

const INVALID_CODE: &str = "Invalid or expired reset code.";

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub message: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub valid: bool,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(alias = "verification_code")]
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

async fn find_user(state: &AppState, email: &str) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&state.db)
            .await?,
    )
}

fn require_code(code: &str) -> Result<String, AppError> {
    normalize_code(code)
        .ok_or_else(|| AppError::Validation("Please enter a valid 6-digit code".to_string()))
}

/// POST /api/v1/auth/send-reset-code
///
/// Responds identically whether or not the account exists.
pub async fn handle_send_reset_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, AppError> {
    let email = require_email(&req.email)?;

    let rule = ThrottleRule::new(
        state.config.reset_requests_per_window,
        state.config.reset_window_secs,
    );
    state
        .throttle
        .check_and_record(&format!("reset:{email}"), rule)
        .await?;

    let ttl_minutes = state.config.reset_code_ttl_minutes;
    match find_user(&state, &email).await? {
        Some(user) => {
            let code = issue_code(&state.db, user.id, ttl_minutes).await?;
            state
                .mailer
                .send_reset_code(&user.email, &code, ttl_minutes)
                .await?;
        }
        None => info!("Reset code requested for unknown email; nothing sent"),
    }

    Ok(Json(SendCodeResponse {
        message: "If an account exists for this email, a reset code has been sent.".to_string(),
        expires_in_seconds: ttl_minutes * 60,
    }))
}

/// POST /api/v1/auth/verify-reset-code
///
/// Checks the code without consuming it. Misses count toward the attempt limit.
pub async fn handle_verify_reset_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let email = require_email(&req.email)?;
    let code = require_code(&req.code)?;
    let user = find_user(&state, &email)
        .await?
        .ok_or_else(|| AppError::Validation(INVALID_CODE.to_string()))?;

    let mut tx = state.db.begin().await?;
    let outcome = check_code(
        &mut *tx,
        user.id,
        &code,
        state.config.reset_max_attempts,
        false,
    )
    .await?;
    tx.commit().await?;

    match outcome {
        CodeCheck::Match { expires_at, .. } => Ok(Json(VerifyCodeResponse {
            valid: true,
            expires_in_seconds: (expires_at - Utc::now()).num_seconds().max(0),
        })),
        _ => Err(AppError::Validation(INVALID_CODE.to_string())),
    }
}

/// POST /api/v1/auth/reset-password
///
/// Consumes the code, sets the new password and signs the user out everywhere.
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    let email = require_email(&req.email)?;
    let code = require_code(&req.code)?;
    check_password_policy(&req.new_password)?;

    let user = find_user(&state, &email)
        .await?
        .ok_or_else(|| AppError::Validation(INVALID_CODE.to_string()))?;

    let mut tx = state.db.begin().await?;
    let outcome = check_code(
        &mut *tx,
        user.id,
        &code,
        state.config.reset_max_attempts,
        true,
    )
    .await?;

    if !outcome.is_match() {
        // Keep the attempt counter update.
        tx.commit().await?;
        return Err(AppError::Validation(INVALID_CODE.to_string()));
    }

    let password_hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    let revoked = revoke_user_sessions(&mut *tx, user.id, None).await?;
    tx.commit().await?;

    info!("Password reset for user {}, revoked {revoked} sessions", user.id);
    Ok(Json(ResetPasswordResponse {
        message: "Password has been reset successfully.".to_string(),
    }))
}

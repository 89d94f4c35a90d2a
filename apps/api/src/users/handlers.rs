//! Axum route handlers for the signed-in user's profile and settings.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;

use crate::auth::credentials::verify_password;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{PublicUser, UserRow};
use crate::state::AppState;
use crate::users::preferences::{Preferences, PreferencesPatch};

const MAX_FULL_NAME_LEN: usize = 120;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub preferences: Option<PreferencesPatch>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

fn clean_full_name(raw: &str) -> Result<Option<String>, AppError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_FULL_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Full name must be at most {MAX_FULL_NAME_LEN} characters"
        )));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// GET /api/v1/users/profile
pub async fn handle_get_profile(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.user.into())
}

/// PUT /api/v1/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let full_name = match req.full_name.as_deref() {
        Some(raw) => clean_full_name(raw)?,
        None => auth.user.full_name.clone(),
    };

    let mut preferences = Preferences::from_stored(&auth.user.preferences);
    if let Some(patch) = req.preferences {
        preferences.apply(patch);
    }
    let preferences =
        serde_json::to_value(&preferences).map_err(|e| AppError::Internal(e.into()))?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET full_name = $1, preferences = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&full_name)
    .bind(&preferences)
    .bind(auth.id())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/profile
///
/// Cascades to sessions, reset codes, resumes and usage history.
pub async fn handle_delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    if !verify_password(&req.password, &auth.user.password_hash) {
        return Err(AppError::Unauthorized("Password is incorrect".to_string()));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(auth.id())
        .execute(&state.db)
        .await?;

    info!("Deleted account {}", auth.id());
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_full_name() {
        assert_eq!(clean_full_name("  Ada Lovelace ").unwrap(), Some("Ada Lovelace".to_string()));
        assert_eq!(clean_full_name("   ").unwrap(), None);
        assert!(clean_full_name(&"a".repeat(121)).is_err());
    }
}

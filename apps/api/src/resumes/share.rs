//! Public read-only share links.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::session::random_hex;

pub const SHARE_TOKEN_BYTES: usize = 16;

pub fn share_url(public_base_url: &str, token: &str) -> String {
    format!("{}/share/{token}", public_base_url.trim_end_matches('/'))
}

/// Returns the existing token, or installs a fresh one.
pub async fn ensure_share_token(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE resumes
        SET share_token = COALESCE(share_token, $3)
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING share_token
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .bind(random_hex(SHARE_TOKEN_BYTES))
    .fetch_optional(pool)
    .await
}

pub async fn clear_share_token(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE resumes SET share_token = NULL WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(resume_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// What a share link reveals. Carries no owner identity.
#[derive(Debug, Serialize, FromRow)]
pub struct SharedResume {
    pub title: String,
    pub template_id: i32,
    pub version: i32,
    pub content: Value,
    pub updated_at: DateTime<Utc>,
}

pub async fn find_shared(pool: &PgPool, token: &str) -> Result<Option<SharedResume>, sqlx::Error> {
    sqlx::query_as::<_, SharedResume>(
        r#"
        SELECT r.title, r.template_id, v.version, v.content, r.updated_at
        FROM resumes r
        JOIN resume_versions v ON v.resume_id = r.id AND v.version = r.current_version
        WHERE r.share_token = $1 AND r.deleted_at IS NULL
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_url_trims_trailing_slash() {
        assert_eq!(
            share_url("https://gide.app/", "abc123"),
            "https://gide.app/share/abc123"
        );
    }

    #[test]
    fn test_token_length() {
        assert_eq!(random_hex(SHARE_TOKEN_BYTES).len(), 32);
    }
}

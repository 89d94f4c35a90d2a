//! Opaque bearer sessions.
//!
//! Tokens are 32 random bytes, hex encoded, handed to the client once.
//! Only the SHA-256 of a token is stored, so a leaked `sessions` table
//! cannot be replayed.

use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::user::UserRow;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

pub(crate) fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes_to_hex(&bytes)
}

pub(crate) fn sha256_hex(value: &str) -> String {
    bytes_to_hex(&Sha256::digest(value.as_bytes()))
}

pub fn generate_token() -> String {
    random_hex(32)
}

pub struct NewSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl_minutes: i64,
) -> Result<NewSession, sqlx::Error> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(sha256_hex(&token))
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(NewSession { token, expires_at })
}

/// Resolves a token to its user. Expired sessions are deleted on sight.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<UserRow>, sqlx::Error> {
    let token_hash = sha256_hex(token);

    let expired = sqlx::query(
        "DELETE FROM sessions WHERE token_hash = $1 AND expires_at <= now()",
    )
    .bind(&token_hash)
    .execute(pool)
    .await?;
    if expired.rows_affected() > 0 {
        debug!("Purged expired session");
        return Ok(None);
    }

    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.*
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn revoke_session(pool: &PgPool, token_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revokes every session of a user, optionally sparing the caller's own.
pub async fn revoke_user_sessions<'e, E>(
    executor: E,
    user_id: Uuid,
    keep_token_hash: Option<&str>,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM sessions WHERE user_id = $1 AND ($2::text IS NULL OR token_hash <> $2)",
    )
    .bind(user_id)
    .bind(keep_token_hash)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_sha256_hex_is_stable() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(sha256_hex("abc"), sha256_hex("abd"));
    }

    #[test]
    fn test_bytes_to_hex_pads() {
        assert_eq!(bytes_to_hex(&[0x00, 0x0f, 0xff]), "000fff");
    }
}

//! Persistence for reset codes.
//!
//! At most one live code exists per user: issuing deletes the previous ones.
//! A live code is unconsumed and unexpired. Every miss against the live code
//! increments `attempts`; reaching the limit consumes (invalidates) it.

use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::password_reset::code::{generate_reset_code, hash_reset_code};

#[derive(Debug, Clone, FromRow)]
pub struct LiveCode {
    pub id: Uuid,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeCheck {
    /// The presented code matches the live code.
    Match { id: Uuid, expires_at: DateTime<Utc> },
    /// The presented code is wrong. `exhausted` means the live code is now dead.
    Mismatch { id: Uuid, attempts: i32, exhausted: bool },
    /// No unconsumed, unexpired code exists.
    NoLiveCode,
}

impl CodeCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, CodeCheck::Match { .. })
    }
}

/// Decides the outcome of presenting `presented_hash` against the live code.
pub fn evaluate(live: Option<&LiveCode>, presented_hash: &str, max_attempts: i32) -> CodeCheck {
    let Some(live) = live else {
        return CodeCheck::NoLiveCode;
    };
    if live.code_hash == presented_hash {
        return CodeCheck::Match {
            id: live.id,
            expires_at: live.expires_at,
        };
    }
    let attempts = live.attempts + 1;
    CodeCheck::Mismatch {
        id: live.id,
        attempts,
        exhausted: attempts >= max_attempts,
    }
}

/// Replaces any live codes for the user with a fresh one and returns its
/// plaintext for delivery.
pub async fn issue_code(
    pool: &PgPool,
    user_id: Uuid,
    ttl_minutes: i64,
) -> Result<String, sqlx::Error> {
    let code = generate_reset_code();
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM password_reset_codes WHERE user_id = $1 AND consumed_at IS NULL")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO password_reset_codes (id, user_id, code_hash, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(hash_reset_code(&code))
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("Issued password reset code for user {user_id}");
    Ok(code)
}

/// Checks `code` against the user's live code inside the caller's transaction.
///
/// The live row is locked, so concurrent checks serialize. With `consume`
/// set, a match marks the code used; otherwise a match leaves it live.
/// Misses always count against the attempt limit.
pub async fn check_code(
    conn: &mut PgConnection,
    user_id: Uuid,
    code: &str,
    max_attempts: i32,
    consume: bool,
) -> Result<CodeCheck, sqlx::Error> {
    let live = sqlx::query_as::<_, LiveCode>(
        r#"
        SELECT id, code_hash, attempts, expires_at
        FROM password_reset_codes
        WHERE user_id = $1
          AND consumed_at IS NULL
          AND expires_at > now()
        ORDER BY created_at DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let outcome = evaluate(live.as_ref(), &hash_reset_code(code), max_attempts);

    match &outcome {
        CodeCheck::Match { id, .. } if consume => {
            sqlx::query("UPDATE password_reset_codes SET consumed_at = now() WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        CodeCheck::Mismatch {
            id,
            attempts,
            exhausted,
        } => {
            sqlx::query(
                r#"
                UPDATE password_reset_codes
                SET attempts = $2,
                    consumed_at = CASE WHEN $3 THEN now() ELSE consumed_at END
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(attempts)
            .bind(exhausted)
            .execute(&mut *conn)
            .await?;
            if *exhausted {
                warn!("Reset code for user {user_id} invalidated after {attempts} failed attempts");
            }
        }
        _ => {}
    }

    Ok(outcome)
}

//! Resume persistence. `resume_versions` is append-only: every edit inserts
//! version n+1 and moves `resumes.current_version` forward.

use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeVersionRow};

pub struct NewVersion<'a> {
    pub title: Option<&'a str>,
    pub template_id: Option<i32>,
    pub content: &'a Value,
}

pub async fn create_resume(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    template_id: i32,
    content: &Value,
) -> Result<(ResumeRow, ResumeVersionRow), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, title, template_id, current_version)
        VALUES ($1, $2, $3, $4, 1)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .fetch_one(&mut *tx)
    .await?;

    let version = sqlx::query_as::<_, ResumeVersionRow>(
        "INSERT INTO resume_versions (id, resume_id, version, content) VALUES ($1, $2, 1, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(resume.id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Created resume {} for user {user_id}", resume.id);
    Ok((resume, version))
}

/// Appends the next version under a row lock on the resume, so concurrent
/// saves get distinct version numbers. `None` when the resume is not the
/// caller's or has been deleted.
pub async fn append_version(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    update: NewVersion<'_>,
) -> Result<Option<(ResumeRow, ResumeVersionRow)>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT current_version FROM resumes
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(current) = current else {
        return Ok(None);
    };
    let next = current + 1;

    let version = sqlx::query_as::<_, ResumeVersionRow>(
        "INSERT INTO resume_versions (id, resume_id, version, content) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(next)
    .bind(update.content)
    .fetch_one(&mut *tx)
    .await?;

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes
        SET current_version = $2,
            title = COALESCE($3, title),
            template_id = COALESCE($4, template_id),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(next)
    .bind(update.title)
    .bind(update.template_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Resume {resume_id} advanced to version {next}");
    Ok(Some((resume, version)))
}

pub async fn get_owned_resume(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// The newest version of each of the user's live resumes, keyed by resume id.
pub async fn current_versions(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ResumeVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeVersionRow>(
        r#"
        SELECT v.*
        FROM resume_versions v
        JOIN resumes r ON r.id = v.resume_id AND r.current_version = v.version
        WHERE r.user_id = $1 AND r.deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_version(
    pool: &PgPool,
    resume_id: Uuid,
    version: i32,
) -> Result<Option<ResumeVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE resume_id = $1 AND version = $2",
    )
    .bind(resume_id)
    .bind(version)
    .fetch_optional(pool)
    .await
}

pub async fn list_versions(
    pool: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<ResumeVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE resume_id = $1 ORDER BY version DESC",
    )
    .bind(resume_id)
    .fetch_all(pool)
    .await
}

pub async fn set_snapshot_key(
    pool: &PgPool,
    version_id: Uuid,
    s3_key: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resume_versions SET s3_key = $2 WHERE id = $1 AND s3_key IS NULL")
        .bind(version_id)
        .bind(s3_key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Soft delete. Clears the share token so public links stop resolving.
pub async fn soft_delete(pool: &PgPool, user_id: Uuid, resume_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE resumes
        SET deleted_at = now(), share_token = NULL, updated_at = now()
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

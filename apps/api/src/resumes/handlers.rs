//! Axum route handlers for resume CRUD, versions, export and sharing.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeVersionRow};
use crate::models::user::UserRow;
use crate::resumes::content::{clean_title, ResumeContent, ValidationReport};
use crate::resumes::export::{fetch_snapshot, snapshot_key, upload_snapshot};
use crate::resumes::render::{download_filename, render_markdown};
use crate::resumes::share::{self, share_url, SharedResume};
use crate::resumes::versioning::{self, NewVersion};
use crate::state::AppState;
use crate::subscription::plans::Plan;
use crate::subscription::usage::{ensure_quota, record_usage, UsageKind};
use crate::templates::catalog::find_template;

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub title: Option<String>,
    pub template_id: i32,
    #[serde(default)]
    pub content: ResumeContent,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub title: Option<String>,
    pub template_id: Option<i32>,
    pub content: ResumeContent,
}

#[derive(Debug, Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub title: String,
    pub template_id: i32,
    pub current_version: i32,
    pub missing_field_count: usize,
    pub shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetail {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub version: i32,
    pub content: Value,
    pub missing_fields: Vec<String>,
    pub share_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub share_token: String,
    pub share_url: String,
}

/// Rejects unknown templates (400) and premium ones the plan does not cover (403).
fn check_template(user: &UserRow, template_id: i32) -> Result<(), AppError> {
    let template = find_template(template_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown template {template_id}")))?;
    if template.premium && !Plan::from_tier(&user.tier).entitlements().premium_templates {
        return Err(AppError::Forbidden(format!(
            "{} is a premium template. Upgrade to Pro to use it.",
            template.name
        )));
    }
    Ok(())
}

/// Normalizes and validates content, returning the stored JSON and the report.
fn prepare_content(content: ResumeContent) -> Result<(Value, ValidationReport), AppError> {
    let content = content.normalized();
    let report = content.validate();
    if !report.is_valid() {
        return Err(AppError::Validation(report.error_summary()));
    }
    let value = serde_json::to_value(&content).map_err(|e| AppError::Internal(e.into()))?;
    Ok((value, report))
}

fn detail(state: &AppState, resume: ResumeRow, version: ResumeVersionRow) -> ResumeDetail {
    let missing_fields = ResumeContent::from_stored(&version.content)
        .validate()
        .missing_fields;
    let share_url = resume
        .share_token
        .as_deref()
        .map(|token| share_url(&state.config.public_base_url, token));
    ResumeDetail {
        resume,
        version: version.version,
        content: version.content,
        missing_fields,
        share_url,
    }
}

async fn owned_resume(state: &AppState, auth: &AuthUser, id: Uuid) -> Result<ResumeRow, AppError> {
    versioning::get_owned_resume(&state.db, auth.id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn version_of(
    state: &AppState,
    resume: &ResumeRow,
    version: i32,
) -> Result<ResumeVersionRow, AppError> {
    versioning::get_version(&state.db, resume.id, version)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Version {version} of resume {} not found", resume.id))
        })
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeDetail>), AppError> {
    let title = clean_title(req.title.as_deref()).map_err(AppError::Validation)?;
    check_template(&auth.user, req.template_id)?;
    let (content, _) = prepare_content(req.content)?;

    let (resume, version) =
        versioning::create_resume(&state.db, auth.id(), &title, req.template_id, &content).await?;

    Ok((StatusCode::CREATED, Json(detail(&state, resume, version))))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let resumes = versioning::list_resumes(&state.db, auth.id()).await?;
    let versions = versioning::current_versions(&state.db, auth.id()).await?;

    let summaries = resumes
        .into_iter()
        .map(|r| {
            let missing_field_count = versions
                .iter()
                .find(|v| v.resume_id == r.id)
                .map(|v| ResumeContent::from_stored(&v.content).validate().missing_fields.len())
                .unwrap_or(0);
            ResumeSummary {
                id: r.id,
                title: r.title,
                template_id: r.template_id,
                current_version: r.current_version,
                missing_field_count,
                shared: r.share_token.is_some(),
                created_at: r.created_at,
                updated_at: r.updated_at,
            }
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetail>, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    let version = version_of(&state, &resume, resume.current_version).await?;
    Ok(Json(detail(&state, resume, version)))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeDetail>, AppError> {
    let title = match req.title.as_deref() {
        Some(raw) => Some(clean_title(Some(raw)).map_err(AppError::Validation)?),
        None => None,
    };
    if let Some(template_id) = req.template_id {
        check_template(&auth.user, template_id)?;
    }
    let (content, _) = prepare_content(req.content)?;

    let (resume, version) = versioning::append_version(
        &state.db,
        auth.id(),
        id,
        NewVersion {
            title: title.as_deref(),
            template_id: req.template_id,
            content: &content,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    Ok(Json(detail(&state, resume, version)))
}

/// GET /api/v1/resumes/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ResumeVersionRow>>, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    Ok(Json(versioning::list_versions(&state.db, resume.id).await?))
}

/// GET /api/v1/resumes/:id/versions/:version
pub async fn handle_get_version(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, version)): Path<(Uuid, i32)>,
) -> Result<Json<ResumeVersionRow>, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    Ok(Json(version_of(&state, &resume, version).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !versioning::soft_delete(&state.db, auth.id(), id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    info!("User {} deleted resume {id}", auth.id());
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/download
///
/// Serves the current version as Markdown, snapshotting it to S3 on first export.
pub async fn handle_download_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    ensure_quota(&state.db, &auth.user, UsageKind::Export).await?;

    let version = version_of(&state, &resume, resume.current_version).await?;
    let bucket = &state.config.s3_bucket;

    let body = match version.s3_key.as_deref() {
        Some(key) => fetch_snapshot(&state.s3, bucket, key).await?,
        None => {
            let key = snapshot_key(auth.id(), resume.id, version.version);
            let content = ResumeContent::from_stored(&version.content);
            let markdown = render_markdown(&resume.title, &content);
            upload_snapshot(&state.s3, bucket, &key, markdown.clone()).await?;
            versioning::set_snapshot_key(&state.db, version.id, &key).await?;
            markdown.into()
        }
    };

    record_usage(&state.db, auth.id(), UsageKind::Export).await?;
    info!(
        "User {} exported resume {} v{}",
        auth.id(),
        resume.id,
        version.version
    );

    let filename = download_filename(&resume.title, version.version);
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// POST /api/v1/resumes/:id/share
pub async fn handle_share_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareResponse>, AppError> {
    let token = share::ensure_share_token(&state.db, auth.id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    Ok(Json(ShareResponse {
        share_url: share_url(&state.config.public_base_url, &token),
        share_token: token,
    }))
}

/// DELETE /api/v1/resumes/:id/share
pub async fn handle_unshare_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !share::clear_share_token(&state.db, auth.id(), id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/shared/:token
pub async fn handle_get_shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedResume>, AppError> {
    share::find_shared(&state.db, &token)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Shared resume not found".to_string()))
}

//! GET /api/v1/dashboard: one call for the dashboard page.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::models::user::PublicUser;
use crate::resumes::versioning::list_resumes;
use crate::state::AppState;
use crate::subscription::usage::{usage_summary, UsageSummary};

#[derive(Debug, Serialize)]
pub struct ResumeVersionInfo {
    pub id: Uuid,
    pub title: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: PublicUser,
    pub resume_count: usize,
    pub resume_versions: Vec<ResumeVersionInfo>,
    pub total_versions: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub plan: UsageSummary,
}

struct ResumeStats {
    versions: Vec<ResumeVersionInfo>,
    total_versions: i64,
    last_updated: Option<DateTime<Utc>>,
}

// Versions are numbered 1..=current_version with no gaps.
fn resume_stats(resumes: Vec<ResumeRow>) -> ResumeStats {
    let total_versions = resumes.iter().map(|r| i64::from(r.current_version)).sum();
    let last_updated = resumes.iter().map(|r| r.updated_at).max();
    let versions = resumes
        .into_iter()
        .map(|r| ResumeVersionInfo {
            id: r.id,
            title: r.title,
            version: r.current_version,
            updated_at: r.updated_at,
        })
        .collect();
    ResumeStats {
        versions,
        total_versions,
        last_updated,
    }
}

pub async fn handle_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let resumes = list_resumes(&state.db, auth.id()).await?;
    let plan = usage_summary(&state.db, &auth.user).await?;
    let stats = resume_stats(resumes);

    Ok(Json(DashboardResponse {
        user: auth.user.into(),
        resume_count: stats.versions.len(),
        resume_versions: stats.versions,
        total_versions: stats.total_versions,
        last_updated: stats.last_updated,
        plan,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn resume(title: &str, version: i32, updated_at: DateTime<Utc>) -> ResumeRow {
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            title: title.into(),
            template_id: 2,
            current_version: version,
            share_token: None,
            created_at: updated_at,
            updated_at,
            deleted_at: None,
        }
    }

    #[test]
    fn test_stats_for_no_resumes() {
        let stats = resume_stats(Vec::new());
        assert!(stats.versions.is_empty());
        assert_eq!(stats.total_versions, 0);
        assert_eq!(stats.last_updated, None);
    }

    #[test]
    fn test_stats_aggregate_versions() {
        let now = Utc::now();
        let stats = resume_stats(vec![
            resume("Newest", 3, now),
            resume("Older", 2, now - Duration::days(2)),
        ]);
        assert_eq!(stats.versions.len(), 2);
        assert_eq!(stats.versions[0].title, "Newest");
        assert_eq!(stats.total_versions, 5);
        assert_eq!(stats.last_updated, Some(now));
    }
}

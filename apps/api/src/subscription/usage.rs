//! Monthly usage metering against plan entitlements.
//!
//! Periods are calendar months in UTC. Usage is recorded only after the
//! metered operation succeeds, so failed AI calls do not burn quota.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::subscription::plans::{Entitlements, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    AiGeneration,
    Export,
    Tailoring,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::AiGeneration => "ai_generation",
            UsageKind::Export => "export",
            UsageKind::Tailoring => "tailoring",
        }
    }

    /// `None` means unlimited; `Some(0)` means the plan lacks the feature.
    pub fn limit(&self, entitlements: &Entitlements) -> Option<u32> {
        match self {
            UsageKind::AiGeneration => entitlements.ai_generations_per_month,
            UsageKind::Export => entitlements.exports_per_month,
            UsageKind::Tailoring => {
                if entitlements.job_tailoring {
                    None
                } else {
                    Some(0)
                }
            }
        }
    }

    fn denial_message(&self, limit: u32) -> String {
        match (self, limit) {
            (UsageKind::Tailoring, 0) => {
                "Job tailoring is not included in your plan. Upgrade to Pro to unlock it.".to_string()
            }
            (UsageKind::AiGeneration, _) => format!(
                "You have used all {limit} AI generations included in your plan this month. Upgrade for more."
            ),
            (UsageKind::Export, _) => format!(
                "You have used all {limit} exports included in your plan this month. Upgrade for unlimited exports."
            ),
            (UsageKind::Tailoring, _) => format!(
                "You have used all {limit} tailoring runs included in your plan this month."
            ),
        }
    }
}

pub fn period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub fn within_quota(used: i64, limit: Option<u32>) -> bool {
    match limit {
        None => true,
        Some(limit) => used < i64::from(limit),
    }
}

pub async fn count_usage(
    pool: &PgPool,
    user_id: Uuid,
    kind: UsageKind,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM usage_events WHERE user_id = $1 AND kind = $2 AND created_at >= $3",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Fails with 403 when the user's plan has no remaining quota for `kind`.
pub async fn ensure_quota(pool: &PgPool, user: &UserRow, kind: UsageKind) -> Result<(), AppError> {
    let limit = kind.limit(&Plan::from_tier(&user.tier).entitlements());
    let Some(limit_value) = limit else {
        return Ok(());
    };
    if limit_value == 0 {
        return Err(AppError::Forbidden(kind.denial_message(0)));
    }
    let used = count_usage(pool, user.id, kind, period_start(Utc::now())).await?;
    if within_quota(used, limit) {
        Ok(())
    } else {
        Err(AppError::Forbidden(kind.denial_message(limit_value)))
    }
}

pub async fn record_usage(pool: &PgPool, user_id: Uuid, kind: UsageKind) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO usage_events (id, user_id, kind) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageMeter {
    pub used: i64,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub plan: Plan,
    pub entitlements: Entitlements,
    pub period_start: DateTime<Utc>,
    pub ai_generations: UsageMeter,
    pub exports: UsageMeter,
    pub tailoring: UsageMeter,
}

pub async fn usage_summary(pool: &PgPool, user: &UserRow) -> Result<UsageSummary, sqlx::Error> {
    let plan = Plan::from_tier(&user.tier);
    let entitlements = plan.entitlements();
    let since = period_start(Utc::now());

    Ok(UsageSummary {
        plan,
        entitlements,
        period_start: since,
        ai_generations: meter(pool, user.id, UsageKind::AiGeneration, since, &entitlements).await?,
        exports: meter(pool, user.id, UsageKind::Export, since, &entitlements).await?,
        tailoring: meter(pool, user.id, UsageKind::Tailoring, since, &entitlements).await?,
    })
}

async fn meter(
    pool: &PgPool,
    user_id: Uuid,
    kind: UsageKind,
    since: DateTime<Utc>,
    entitlements: &Entitlements,
) -> Result<UsageMeter, sqlx::Error> {
    Ok(UsageMeter {
        used: count_usage(pool, user_id, kind, since).await?,
        limit: kind.limit(entitlements),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_start_is_first_of_month() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 15, 42, 7).unwrap();
        assert_eq!(
            period_start(now),
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_within_quota() {
        assert!(within_quota(1, Some(2)));
        assert!(!within_quota(2, Some(2)));
        assert!(within_quota(10_000, None));
        assert!(!within_quota(0, Some(0)));
    }

    #[test]
    fn test_limits_follow_entitlements() {
        let free = Plan::Free.entitlements();
        assert_eq!(UsageKind::Export.limit(&free), Some(2));
        assert_eq!(UsageKind::Tailoring.limit(&free), Some(0));
        let pro = Plan::Pro.entitlements();
        assert_eq!(UsageKind::Tailoring.limit(&pro), None);
        assert_eq!(UsageKind::AiGeneration.limit(&pro), Some(100));
    }

    #[test]
    fn test_denial_message_mentions_upgrade() {
        assert!(UsageKind::Tailoring.denial_message(0).contains("Upgrade to Pro"));
        assert!(UsageKind::Export.denial_message(2).contains("all 2 exports"));
    }
}

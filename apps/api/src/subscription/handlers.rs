//! Axum route handlers for plans and the caller's subscription.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::subscription::plans::{addon_catalog, plan_catalog, Addon, Plan, PlanDetails};
use crate::subscription::usage::{usage_summary, UsageSummary};

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanDetails>,
    pub addons: Vec<Addon>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan: String,
}

/// GET /api/v1/subscription/plans
pub async fn handle_list_plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: plan_catalog(),
        addons: addon_catalog(),
    })
}

/// GET /api/v1/subscription
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UsageSummary>, AppError> {
    Ok(Json(usage_summary(&state.db, &auth.user).await?))
}

/// POST /api/v1/subscription
///
/// Records the plan change. Billing happens outside this service.
pub async fn handle_change_plan(
    State(state): State<AppState>,
    mut auth: AuthUser,
    Json(req): Json<ChangePlanRequest>,
) -> Result<Json<UsageSummary>, AppError> {
    let plan: Plan = req.plan.parse().map_err(AppError::Validation)?;

    sqlx::query("UPDATE users SET tier = $1, updated_at = now() WHERE id = $2")
        .bind(plan.as_str())
        .bind(auth.id())
        .execute(&state.db)
        .await?;
    info!("User {} moved from {} to {}", auth.id(), auth.user.tier, plan.as_str());

    auth.user.tier = plan.as_str().to_string();
    Ok(Json(usage_summary(&state.db, &auth.user).await?))
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ai::handlers as ai;
use crate::ai::jd_text::MAX_JD_BYTES;
use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::password_reset::handlers as password_reset;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::subscription::handlers as subscription;
use crate::templates::handlers as templates;
use crate::users::handlers as users;

// Room for multipart framing around a maximum-size upload.
const TAILOR_BODY_LIMIT: usize = MAX_JD_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts and sessions
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route(
            "/api/v1/auth/change-password",
            post(auth::handle_change_password),
        )
        .route(
            "/api/v1/auth/password-strength",
            post(auth::handle_password_strength),
        )
        // Password reset
        .route(
            "/api/v1/auth/send-reset-code",
            post(password_reset::handle_send_reset_code),
        )
        .route(
            "/api/v1/auth/verify-reset-code",
            post(password_reset::handle_verify_reset_code),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(password_reset::handle_reset_password),
        )
        .route(
            "/api/v1/password-reset/forgot",
            post(password_reset::handle_send_reset_code),
        )
        .route(
            "/api/v1/password-reset/reset",
            post(password_reset::handle_reset_password),
        )
        // Profile and settings
        .route(
            "/api/v1/users/profile",
            get(users::handle_get_profile)
                .put(users::handle_update_profile)
                .delete(users::handle_delete_account),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .put(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/versions",
            get(resumes::handle_list_versions),
        )
        .route(
            "/api/v1/resumes/:id/versions/:version",
            get(resumes::handle_get_version),
        )
        .route(
            "/api/v1/resumes/:id/download",
            get(resumes::handle_download_resume),
        )
        .route(
            "/api/v1/resumes/:id/share",
            post(resumes::handle_share_resume).delete(resumes::handle_unshare_resume),
        )
        .route(
            "/api/v1/resumes/:id/tailor",
            post(ai::handle_tailor_resume).layer(DefaultBodyLimit::max(TAILOR_BODY_LIMIT)),
        )
        .route("/api/v1/shared/:token", get(resumes::handle_get_shared))
        // AI writing
        .route("/api/v1/resume/ai-suggest", post(ai::handle_ai_suggest))
        .route("/api/v1/ai/cover-letter", post(ai::handle_cover_letter))
        // Catalogs, plans and the dashboard
        .route("/api/v1/templates", get(templates::handle_list_templates))
        .route("/api/v1/templates/:id", get(templates::handle_get_template))
        .route(
            "/api/v1/subscription",
            get(subscription::handle_get_subscription).post(subscription::handle_change_plan),
        )
        .route(
            "/api/v1/subscription/plans",
            get(subscription::handle_list_plans),
        )
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        .with_state(state)
}

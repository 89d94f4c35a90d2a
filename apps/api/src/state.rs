use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::password_reset::mailer::Mailer;
use crate::throttle::RequestThrottle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis-backed when `REDIS_URL` is set, per-process otherwise.
    pub throttle: Arc<dyn RequestThrottle>,
    pub s3: S3Client,
    pub llm: LlmClient,
    /// Resend when `RESEND_API_KEY` is set, the log mailer otherwise.
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When unset, request throttling falls back to a per-process limiter.
    pub redis_url: Option<String>,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// When unset, reset codes are written to the log instead of emailed.
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub frontend_origin: String,
    pub public_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_minutes: i64,
    pub reset_code_ttl_minutes: i64,
    pub reset_max_attempts: i32,
    pub reset_requests_per_window: usize,
    pub reset_window_secs: u64,
    pub ai_requests_per_minute: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            resend_api_key: optional_env("RESEND_API_KEY"),
            mail_from: optional_env("MAIL_FROM")
                .unwrap_or_else(|| "GIDE <no-reply@gide.app>".to_string()),
            frontend_origin: optional_env("FRONTEND_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_ttl_minutes: parse_env("SESSION_TTL_MINUTES", 1440)?,
            reset_code_ttl_minutes: parse_env("RESET_CODE_TTL_MINUTES", 20)?,
            reset_max_attempts: parse_env("RESET_MAX_ATTEMPTS", 5)?,
            reset_requests_per_window: parse_env("RESET_REQUESTS_PER_WINDOW", 3)?,
            reset_window_secs: parse_env("RESET_WINDOW_SECS", 900)?,
            ai_requests_per_minute: parse_env("AI_REQUESTS_PER_MINUTE", 10)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("__GIDE_TEST_UNSET_PORT__", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("__GIDE_TEST_TTL_MINUTES__", "45");
        let value: i64 = parse_env("__GIDE_TEST_TTL_MINUTES__", 20).unwrap();
        assert_eq!(value, 45);
        std::env::remove_var("__GIDE_TEST_TTL_MINUTES__");
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("__GIDE_TEST_BAD_PORT__", "eighty");
        let result: Result<u16> = parse_env("__GIDE_TEST_BAD_PORT__", 8080);
        assert!(result.is_err());
        std::env::remove_var("__GIDE_TEST_BAD_PORT__");
    }

    #[test]
    fn test_optional_env_treats_blank_as_unset() {
        std::env::set_var("__GIDE_TEST_BLANK__", "   ");
        assert_eq!(optional_env("__GIDE_TEST_BLANK__"), None);
        std::env::remove_var("__GIDE_TEST_BLANK__");
    }
}

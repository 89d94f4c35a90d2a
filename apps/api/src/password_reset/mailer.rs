//! Delivery of reset codes.

use async_trait::async_trait;
use resend_rs::types::CreateEmailBaseOptions;
use resend_rs::Resend;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;

const RESET_SUBJECT: &str = "Your GIDE password reset code";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

impl From<MailerError> for AppError {
    fn from(e: MailerError) -> Self {
        AppError::Email(e.to_string())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError>;
}

pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from: String) -> Self {
        Self {
            client: Resend::new(api_key),
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        let html = render_reset_email(code, ttl_minutes);
        let email = CreateEmailBaseOptions::new(&self.from, [to_email], RESET_SUBJECT)
            .with_html(&html);
        self.client
            .emails
            .send(email)
            .await
            .map_err(|e| MailerError::Delivery(e.to_string()))?;
        info!("Reset code email dispatched");
        Ok(())
    }
}

/// Development mailer: writes the code to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        warn!(
            to = %to_email,
            code = %code,
            ttl_minutes,
            "RESEND_API_KEY not set; reset code logged instead of emailed"
        );
        Ok(())
    }
}

pub fn render_reset_email(code: &str, ttl_minutes: i64) -> String {
    format!(
        "<p>Hi,</p>\
         <p>Your password reset code is:</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{code}</p>\
         <p>This code is valid for {ttl_minutes} minutes. Enter it on the password reset page \
         to set a new password.</p>\
         <p>If you did not request this, you can ignore this email.</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reset_email_includes_code_and_ttl() {
        let html = render_reset_email("482913", 20);
        assert!(html.contains("482913"));
        assert!(html.contains("valid for 20 minutes"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        assert!(LogMailer
            .send_reset_code("user@example.com", "123456", 20)
            .await
            .is_ok());
    }
}

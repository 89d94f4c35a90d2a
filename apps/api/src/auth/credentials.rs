//! Email normalization, password policy, hashing, and strength scoring.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use serde::Serialize;
use thiserror::Error;

use crate::errors::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must be at most 128 characters long")]
    TooLong,
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Hash(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Trims and lowercases an email. Returns `None` unless it has exactly one `@`
/// with a non-empty local part and a dotted domain.
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.contains('@') || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    let (host, tld) = domain.rsplit_once('.')?;
    if host.is_empty() || tld.is_empty() {
        return None;
    }
    Some(normalized)
}

pub fn require_email(email: &str) -> Result<String, AppError> {
    normalize_email(email).ok_or_else(|| AppError::Validation("Invalid email address".to_string()))
}

pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Returns false for a mismatch or an unparseable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrengthLabel {
    Weak,
    Fair,
    Good,
    Strong,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: StrengthLabel,
}

/// One point each for: length >= 8, lowercase, uppercase, digit, symbol.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= MIN_PASSWORD_LEN,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|c| **c).count() as u8;
    let label = match score {
        0..=2 => StrengthLabel::Weak,
        3 => StrengthLabel::Fair,
        4 => StrengthLabel::Good,
        _ => StrengthLabel::Strong,
    };
    PasswordStrength { score, label }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM "),
            Some("jane.doe@example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_email_rejects_malformed() {
        for bad in ["", "jane", "@example.com", "jane@", "jane@example", "a@b@c.com", "ja ne@x.io", "jane@.com"] {
            assert_eq!(normalize_email(bad), None, "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_password_policy_bounds() {
        assert_eq!(check_password_policy("short"), Err(PasswordError::TooShort));
        assert!(check_password_policy("exactly8").is_ok());
        assert_eq!(
            check_password_policy(&"x".repeat(129)),
            Err(PasswordError::TooLong)
        );
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong horse battery", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_password_strength_labels() {
        assert_eq!(password_strength("abc").label, StrengthLabel::Weak);
        assert_eq!(password_strength("password").label, StrengthLabel::Weak);
        assert_eq!(password_strength("password1").label, StrengthLabel::Fair);
        assert_eq!(password_strength("Password1").label, StrengthLabel::Good);
        let strong = password_strength("Passw0rd!");
        assert_eq!(strong.label, StrengthLabel::Strong);
        assert_eq!(strong.score, 5);
    }
}

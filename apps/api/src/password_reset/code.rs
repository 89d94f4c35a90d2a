//! Reset code generation, normalization and hashing.

use rand::Rng;

use crate::auth::session::sha256_hex;

pub const CODE_LEN: usize = 6;

/// Uniform in 100000..=999999 so the code never has a leading zero.
pub fn generate_reset_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Trims surrounding whitespace. Returns `None` unless exactly six ASCII digits remain.
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.len() != CODE_LEN || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn hash_reset_code(code: &str) -> String {
    sha256_hex(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..500 {
            let code = generate_reset_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_normalize_code_accepts_padded_digits() {
        assert_eq!(normalize_code(" 123456\n"), Some("123456".to_string()));
        assert_eq!(normalize_code("012345"), Some("012345".to_string()));
    }

    #[test]
    fn test_normalize_code_rejects_bad_shapes() {
        for bad in ["", "12345", "1234567", "12a456", "12 456", "١٢٣٤٥٦"] {
            assert_eq!(normalize_code(bad), None, "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_hash_differs_per_code() {
        assert_eq!(hash_reset_code("123456"), hash_reset_code("123456"));
        assert_ne!(hash_reset_code("123456"), hash_reset_code("123457"));
        assert_ne!(hash_reset_code("123456"), "123456");
    }
}

//! Job-description text extraction from uploaded files.

use bytes::Bytes;
use tokio::task::JoinError;
use tracing::warn;

use crate::errors::AppError;

pub const MAX_JD_BYTES: usize = 5 * 1024 * 1024;

pub fn looks_like_pdf(content_type: Option<&str>, data: &[u8]) -> bool {
    content_type == Some("application/pdf") || data.starts_with(b"%PDF")
}

/// Extracts plain text from a PDF or UTF-8 upload. Empty text is a 400.
pub async fn extract_jd_text(content_type: Option<&str>, data: Bytes) -> Result<String, AppError> {
    if data.len() > MAX_JD_BYTES {
        return Err(AppError::Validation(
            "Job description file must be at most 5 MiB".to_string(),
        ));
    }

    let text = if looks_like_pdf(content_type, &data) {
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(extraction_failed)?
            .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?
    } else {
        String::from_utf8(data.to_vec()).map_err(|_| {
            AppError::Validation("Job description must be a PDF or UTF-8 text file".to_string())
        })?
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the job description".to_string(),
        ));
    }
    Ok(text)
}

// pdf-extract panics on some malformed files. Those are bad uploads (400).
fn extraction_failed(err: JoinError) -> AppError {
    if err.is_panic() {
        warn!("PDF extraction panicked on an uploaded file");
        AppError::Validation("Could not read PDF".to_string())
    } else {
        AppError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(looks_like_pdf(Some("application/pdf"), b""));
        assert!(looks_like_pdf(None, b"%PDF-1.7 ..."));
        assert!(!looks_like_pdf(Some("text/plain"), b"We are hiring"));
    }

    #[tokio::test]
    async fn test_panicking_extraction_is_a_bad_upload() {
        let err = tokio::task::spawn_blocking(|| panic!("malformed xref table"))
            .await
            .unwrap_err();
        let mapped = extraction_failed(err);
        assert_eq!(mapped.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(matches!(mapped, AppError::Validation(msg) if msg == "Could not read PDF"));
    }

    #[tokio::test]
    async fn test_plain_text_is_trimmed() {
        let text = extract_jd_text(Some("text/plain"), Bytes::from_static(b"  Rust engineer\n"))
            .await
            .unwrap();
        assert_eq!(text, "Rust engineer");
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let err = extract_jd_text(None, Bytes::from_static(b" \n\t ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected() {
        let err = extract_jd_text(None, Bytes::from_static(&[0xff, 0xfe, 0x00]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("UTF-8")));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let data = Bytes::from(vec![b'a'; MAX_JD_BYTES + 1]);
        assert!(extract_jd_text(None, data).await.is_err());
    }
}

//! Markdown snapshots in S3, one object per exported version.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub fn snapshot_key(user_id: Uuid, resume_id: Uuid, version: i32) -> String {
    format!("resumes/{user_id}/{resume_id}/v{version}.md")
}

pub async fn upload_snapshot(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    markdown: String,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(markdown.into_bytes()))
        .content_type("text/markdown")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Uploaded resume snapshot to s3://{bucket}/{key}");
    Ok(())
}

pub async fn fetch_snapshot(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<Bytes, AppError> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("download of {key} failed: {e}")))?;

    let data = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("reading {key} failed: {e}")))?;
    Ok(data.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_key_layout() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            snapshot_key(user, resume, 4),
            format!("resumes/{user}/{resume}/v4.md")
        );
    }
}

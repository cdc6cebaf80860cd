//! Object storage for uploaded PDFs and answer recordings.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::transcription::AudioFormat;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

pub fn job_description_key(user_id: Uuid) -> String {
    format!("job-descriptions/{user_id}/{}.pdf", Uuid::new_v4())
}

pub fn response_audio_key(user_id: Uuid, question_id: Uuid, format: AudioFormat) -> String {
    format!(
        "responses/{user_id}/{question_id}/{}.{}",
        Uuid::new_v4(),
        format.extension()
    )
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed: {e}"))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_description_key_layout() {
        let user = Uuid::new_v4();
        let key = job_description_key(user);
        assert!(key.starts_with(&format!("job-descriptions/{user}/")));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_response_key_uses_format_extension() {
        let user = Uuid::new_v4();
        let question = Uuid::new_v4();
        let key = response_audio_key(user, question, AudioFormat::Webm);
        assert!(key.starts_with(&format!("responses/{user}/{question}/")));
        assert!(key.ends_with(".webm"));
    }

    #[test]
    fn test_keys_are_unique_per_upload() {
        let user = Uuid::new_v4();
        assert_ne!(job_description_key(user), job_description_key(user));
    }
}

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

const MIB: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub whisper_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on every single collaborator call (completion, transcription).
    pub collaborator_timeout: Duration,
    pub evaluation_max_attempts: u32,
    pub generation_max_attempts: u32,
    pub retry_backoff: Duration,
    pub generation_lease: Duration,
    pub max_pdf_bytes: usize,
    pub max_audio_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            whisper_model: std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "whisper-1".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            collaborator_timeout: Duration::from_secs(parse_env("COLLABORATOR_TIMEOUT_SECS", 120)?),
            evaluation_max_attempts: parse_env("EVALUATION_MAX_ATTEMPTS", 2)?,
            generation_max_attempts: parse_env("GENERATION_MAX_ATTEMPTS", 3)?,
            retry_backoff: Duration::from_millis(parse_env("RETRY_BACKOFF_MS", 500)?),
            generation_lease: Duration::from_secs(parse_env("GENERATION_LEASE_SECS", 300)?),
            max_pdf_bytes: parse_env("MAX_PDF_BYTES", 10 * MIB)?,
            max_audio_bytes: parse_env("MAX_AUDIO_BYTES", 50 * MIB)?,
        })
    }

    pub fn evaluation_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.evaluation_max_attempts, self.retry_backoff)
    }

    pub fn generation_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.generation_max_attempts, self.retry_backoff)
    }

    /// The largest request body any route accepts, with headroom for multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_pdf_bytes.max(self.max_audio_bytes) + MIB
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/rehearse_test".to_string(),
            redis_url: "redis://localhost".to_string(),
            s3_bucket: "rehearse-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            anthropic_api_key: "test".to_string(),
            openai_api_key: "test".to_string(),
            whisper_model: "whisper-1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            collaborator_timeout: Duration::from_secs(5),
            evaluation_max_attempts: 2,
            generation_max_attempts: 3,
            retry_backoff: Duration::ZERO,
            generation_lease: Duration::from_secs(60),
            max_pdf_bytes: 10 * MIB,
            max_audio_bytes: 50 * MIB,
        }
    }
}

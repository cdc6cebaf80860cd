//! Speech-to-text over the OpenAI audio transcription endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::transcription::{AudioFormat, Transcriber, TranscriberError};

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct WhisperClient {
    client: Client,
    api_key: String,
    model: String,
}

impl WhisperClient {
    /// Transcription is a single request, so it gets the whole `deadline`.
    pub fn new(api_key: String, model: String, deadline: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(deadline).build()?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String, TranscriberError> {
        let file = Part::bytes(audio.to_vec())
            .file_name(format!("answer.{}", format.extension()))
            .mime_str(format.mime_type())?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file);

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            // 400 means the upload itself could not be decoded.
            if status.as_u16() == 400 {
                return Err(TranscriberError::Unreadable(message));
            }
            return Err(TranscriberError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        debug!("Whisper returned {} chars", body.text.len());
        Ok(body.text)
    }
}

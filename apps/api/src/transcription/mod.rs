//! Transcription Adapter: wraps the speech-to-text collaborator.
//!
//! Normalises whitespace and refuses to turn silence into a "successful" empty
//! transcript. No internal retries: a failed transcription is surfaced as-is.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::errors::PipelineError;
use crate::retry::with_timeout;

pub mod whisper;

#[derive(Debug, Error)]
pub enum TranscriberError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("audio could not be decoded: {0}")]
    Unreadable(String),

    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),
}

/// Container formats accepted by the speech-to-text collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Flac,
    M4a,
    Mp3,
    Mp4,
    Mpeg,
    Ogg,
    Wav,
    Webm,
}

impl AudioFormat {
    /// Parses a declared format: a file name, bare extension or MIME type
    /// (`answer.webm`, `webm`, `audio/webm;codecs=opus`).
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        let hint = hint.split(';').next().unwrap_or_default().trim();
        let token = match hint.split_once('/') {
            Some((_, subtype)) => subtype,
            None => hint.rsplit('.').next().unwrap_or(hint),
        };

        Some(match token {
            "flac" | "x-flac" => AudioFormat::Flac,
            "m4a" | "x-m4a" => AudioFormat::M4a,
            "mp3" => AudioFormat::Mp3,
            "mp4" => AudioFormat::Mp4,
            "mpeg" | "mpga" => AudioFormat::Mpeg,
            "ogg" | "oga" | "opus" => AudioFormat::Ogg,
            "wav" | "wave" | "x-wav" | "vnd.wave" => AudioFormat::Wav,
            "webm" => AudioFormat::Webm,
            _ => return None,
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Mpeg => "mpeg",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::Flac => "audio/flac",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Mp3 | AudioFormat::Mpeg => "audio/mpeg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The speech-to-text collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String, TranscriberError>;
}

pub struct TranscriptionAdapter {
    transcriber: Arc<dyn Transcriber>,
    call_timeout: Duration,
}

impl TranscriptionAdapter {
    pub fn new(transcriber: Arc<dyn Transcriber>, call_timeout: Duration) -> Self {
        Self {
            transcriber,
            call_timeout,
        }
    }

    /// Returns a non-empty, whitespace-normalised transcript.
    pub async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::EmptyAudio);
        }

        let raw = with_timeout(self.call_timeout, self.transcriber.transcribe(audio, format))
            .await
            .map_err(|timed_out| TranscriberError::Timeout(timed_out.0))
            .and_then(|result| result)
            .map_err(|e| {
                error!("Transcription of {} bytes of {format} failed: {e}", audio.len());
                PipelineError::TranscriptionFailed(e)
            })?;

        let transcript = normalize_transcript(&raw);
        if transcript.is_empty() {
            return Err(PipelineError::EmptyAudio);
        }

        info!(
            "Transcribed {} bytes of {format} into {} chars",
            audio.len(),
            transcript.chars().count()
        );
        Ok(transcript)
    }
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_transcript(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

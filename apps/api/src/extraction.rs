//! Job description text extraction from uploaded PDFs.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

const PDF_SIGNATURE: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file is not a PDF")]
    NotPdf,

    #[error("PDF could not be read: {0}")]
    Unreadable(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

/// The text-extraction collaborator.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError>;
}

/// Extracts the text layer with `pdf-extract`.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        extract_pdf_text(bytes).await
    }
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Extracts and normalises the text layer of a PDF.
///
/// Parsing runs on the blocking pool; a parser panic is reported as `Unreadable`.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, ExtractionError> {
    if !looks_like_pdf(&bytes) {
        return Err(ExtractionError::NotPdf);
    }

    let size = bytes.len();
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("parser aborted: {e}")))?
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

    let text = normalize_text(&raw);
    if text.is_empty() {
        warn!("PDF of {size} bytes has no text layer");
        return Err(ExtractionError::NoText);
    }

    info!("Extracted {} chars from PDF of {size} bytes", text.chars().count());
    Ok(text)
}

/// Trims every line, drops blank runs longer than one line, and trims the whole.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.trim().to_string()
}

//! Job description upload: validate → store the PDF → extract text → create
//! `pending` record → generate questions inline.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::extraction::{looks_like_pdf, TextExtractor};
use crate::jobs::generator::QuestionGenerator;
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::storage::blobs::{job_description_key, BlobStore};
use crate::storage::InterviewStore;

pub struct JobDescriptionUpload {
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub file_name: String,
    pub bytes: Bytes,
}

pub struct JobDescriptionIntake {
    store: Arc<dyn InterviewStore>,
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<QuestionGenerator>,
    max_pdf_bytes: usize,
}

impl JobDescriptionIntake {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        blobs: Arc<dyn BlobStore>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<QuestionGenerator>,
        max_pdf_bytes: usize,
    ) -> Self {
        Self {
            store,
            blobs,
            extractor,
            generator,
            max_pdf_bytes,
        }
    }

    /// Stores the upload and returns the job description in its terminal state.
    pub async fn ingest(&self, upload: JobDescriptionUpload) -> Result<JobDescription, PipelineError> {
        let company_name = required_field("company_name", &upload.company_name)?;
        let job_title = required_field("job_title", &upload.job_title)?;
        self.validate_file(&upload.file_name, &upload.bytes)?;

        let file_key = job_description_key(upload.user_id);
        self.blobs
            .put(&file_key, upload.bytes.clone(), "application/pdf")
            .await?;

        let extracted_text = match self.extractor.extract(upload.bytes).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Text extraction failed for {file_key}: {e}");
                None
            }
        };

        let inserted = self
            .store
            .insert_job_description(NewJobDescription {
                user_id: upload.user_id,
                company_name,
                job_title,
                file_key: file_key.clone(),
                extracted_text,
            })
            .await;
        let jd = match inserted {
            Ok(jd) => jd,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&file_key).await {
                    warn!("Failed to remove orphaned PDF {file_key}: {cleanup}");
                }
                return Err(e.into());
            }
        };
        info!("Created job description {} for user {}", jd.id, jd.user_id);

        self.generator.generate(jd.id, jd.user_id).await
    }

    fn validate_file(&self, file_name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        if !file_name.trim().to_ascii_lowercase().ends_with(".pdf") {
            return Err(PipelineError::Input("only PDF files are accepted".to_string()));
        }
        if bytes.is_empty() {
            return Err(PipelineError::Input("uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_pdf_bytes {
            return Err(PipelineError::Input(format!(
                "PDF exceeds the {} byte limit",
                self.max_pdf_bytes
            )));
        }
        if !looks_like_pdf(bytes) {
            return Err(PipelineError::Input(
                "uploaded file is not a valid PDF".to_string(),
            ));
        }
        Ok(())
    }
}

fn required_field(name: &str, value: &str) -> Result<String, PipelineError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PipelineError::Input(format!("{name} is required")));
    }
    Ok(value.to_string())
}

use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::engine::EvaluationEngine;
use crate::extraction::TextExtractor;
use crate::jobs::generator::QuestionGenerator;
use crate::jobs::ingest::JobDescriptionIntake;
use crate::jobs::lease::GenerationLocks;
use crate::llm_client::StructuredCompletion;
use crate::responses::submission::SubmissionPipeline;
use crate::storage::blobs::BlobStore;
use crate::storage::InterviewStore;
use crate::transcription::{Transcriber, TranscriptionAdapter};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn InterviewStore>,
    pub intake: Arc<JobDescriptionIntake>,
    pub generator: Arc<QuestionGenerator>,
    pub submissions: Arc<SubmissionPipeline>,
}

/// External collaborators the pipeline is wired against.
pub struct Collaborators {
    pub store: Arc<dyn InterviewStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub llm: Arc<dyn StructuredCompletion>,
    pub transcriber: Arc<dyn Transcriber>,
    pub locks: Arc<dyn GenerationLocks>,
}

impl AppState {
    pub fn new(config: Config, c: Collaborators) -> Self {
        let generator = Arc::new(QuestionGenerator::new(
            c.store.clone(),
            c.llm.clone(),
            c.locks,
            config.generation_retry(),
            config.collaborator_timeout,
        ));

        let intake = Arc::new(JobDescriptionIntake::new(
            c.store.clone(),
            c.blobs.clone(),
            c.extractor,
            generator.clone(),
            config.max_pdf_bytes,
        ));

        let submissions = Arc::new(SubmissionPipeline::new(
            c.store.clone(),
            c.blobs,
            TranscriptionAdapter::new(c.transcriber, config.collaborator_timeout),
            EvaluationEngine::new(c.llm, config.evaluation_retry(), config.collaborator_timeout),
            config.max_audio_bytes,
        ));

        AppState {
            config,
            store: c.store,
            intake,
            generator,
            submissions,
        }
    }
}

//! Question Generator: drives a job description from `pending` to a terminal state.
//!
//! Flow: lease → re-read status → empty-text check → completion (transient retries
//! only) → strict validation → compare-and-set write of all five questions.
//!
//! Any failure other than storage moves the job description to `error`; nothing is
//! ever half-written. A job description that already left `pending` is never touched.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::jobs::lease::GenerationLocks;
use crate::jobs::prompts::{build_question_prompt, question_generation_system};
use crate::jobs::schema::{questions_schema, validate_questions};
use crate::llm_client::{LlmError, OutputSchema, StructuredCompletion};
use crate::models::job_description::JobDescription;
use crate::retry::{with_timeout, RetryPolicy};
use crate::schema::summarize;
use crate::storage::InterviewStore;

const EMPTY_TEXT_MESSAGE: &str =
    "No text could be extracted from the job description; upload a text-based PDF";

pub struct QuestionGenerator {
    store: Arc<dyn InterviewStore>,
    llm: Arc<dyn StructuredCompletion>,
    locks: Arc<dyn GenerationLocks>,
    retry: RetryPolicy,
    call_timeout: Duration,
    schema: OutputSchema,
    system: String,
}

impl QuestionGenerator {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        llm: Arc<dyn StructuredCompletion>,
        locks: Arc<dyn GenerationLocks>,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            llm,
            locks,
            retry,
            call_timeout,
            schema: questions_schema(),
            system: question_generation_system(),
        }
    }

    /// Runs generation once for a `pending` job description owned by `user_id` and
    /// returns it in its terminal state.
    pub async fn generate(&self, id: Uuid, user_id: Uuid) -> Result<JobDescription, PipelineError> {
        let jd = self.load(id, user_id).await?;
        if jd.status.is_terminal() {
            return Err(PipelineError::AlreadyFinalized { id, status: jd.status });
        }

        let Some(lease) = self.locks.try_acquire(id).await? else {
            return Err(PipelineError::GenerationInProgress(id));
        };

        let outcome = self.generate_locked(id, user_id).await;

        if let Err(e) = self.locks.release(lease).await {
            warn!("Failed to release generation lease for {id}: {e}");
        }
        outcome
    }

    async fn generate_locked(&self, id: Uuid, user_id: Uuid) -> Result<JobDescription, PipelineError> {
        // The status may have moved while we waited for the lease.
        let jd = self.load(id, user_id).await?;
        if jd.status.is_terminal() {
            return Err(PipelineError::AlreadyFinalized { id, status: jd.status });
        }

        let text = jd.extracted_text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            warn!("Job description {id} has no usable text; skipping generation");
            return self.fail(id, user_id, EMPTY_TEXT_MESSAGE).await;
        }

        let prompt = build_question_prompt(&jd.company_name, &jd.job_title, text);
        let value = match self.complete(id, &prompt).await {
            Ok(value) => value,
            Err(e) => {
                error!("Question generation for {id} failed: {e}");
                return self
                    .fail(id, user_id, &format!("Question generation failed: {e}"))
                    .await;
            }
        };

        let questions = match validate_questions(&value) {
            Ok(questions) => questions,
            Err(violations) => {
                let summary = summarize(&violations);
                error!("Question generation for {id} returned an unusable result: {summary}");
                return self
                    .fail(
                        id,
                        user_id,
                        &format!("Question generation returned an unusable result: {summary}"),
                    )
                    .await;
            }
        };

        match self.store.complete_generation(id, &questions).await? {
            Some(created) => {
                info!("Stored {} questions for job description {id}", created.len());
                self.load(id, user_id).await
            }
            None => {
                let current = self.load(id, user_id).await?;
                Err(PipelineError::AlreadyFinalized {
                    id,
                    status: current.status,
                })
            }
        }
    }

    /// One completion, repeated only while the failure is transient.
    async fn complete(&self, id: Uuid, prompt: &str) -> Result<Value, LlmError> {
        let mut attempt = 1;
        loop {
            self.retry.wait_before(attempt).await;

            let result = with_timeout(
                self.call_timeout,
                self.llm.complete_structured(&self.system, prompt, &self.schema),
            )
            .await
            .map_err(|timed_out| LlmError::Timeout(timed_out.0))
            .and_then(|result| result);

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && self.retry.has_attempts_after(attempt) => {
                    warn!(
                        "Question generation attempt {}/{} for {id} failed, retrying: {e}",
                        attempt, self.retry.max_attempts
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fail(&self, id: Uuid, user_id: Uuid, message: &str) -> Result<JobDescription, PipelineError> {
        if !self.store.fail_generation(id, message).await? {
            let current = self.load(id, user_id).await?;
            return Err(PipelineError::AlreadyFinalized {
                id,
                status: current.status,
            });
        }
        self.load(id, user_id).await
    }

    async fn load(&self, id: Uuid, user_id: Uuid) -> Result<JobDescription, PipelineError> {
        self.store
            .job_description(id, user_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("job description {id}")))
    }
}

//! Evaluation Engine: turns (question, transcript) into a validated [`Evaluation`].
//!
//! One collaborator call per attempt, validated strictly. Any failure (timeout,
//! collaborator error, schema violation) consumes an attempt; the same request is
//! repeated until the retry budget runs out. Partial score sets never escape.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::evaluation::criteria::Evaluation;
use crate::evaluation::prompts::{build_evaluation_prompt, evaluation_system};
use crate::evaluation::schema::{evaluation_schema, validate_evaluation};
use crate::llm_client::{LlmError, OutputSchema, StructuredCompletion};
use crate::retry::{with_timeout, RetryPolicy};
use crate::schema::{summarize, Violation};

/// What went wrong in a single evaluation attempt.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Collaborator(#[from] LlmError),

    #[error("schema violation: {}", summarize(.0))]
    Schema(Vec<Violation>),
}

/// Evaluation gave up after exhausting its attempts. Carries the last diagnostic.
#[derive(Debug, Error)]
#[error("evaluation failed after {attempts} attempt(s): {last}")]
pub struct EvaluationError {
    pub attempts: u32,
    #[source]
    pub last: AttemptFailure,
}

pub struct EvaluationInput<'a> {
    pub question_text: &'a str,
    pub transcript: &'a str,
    /// Optional extra context; the score still judges the answer to the question.
    pub job_description_text: Option<&'a str>,
}

pub struct EvaluationEngine {
    llm: Arc<dyn StructuredCompletion>,
    retry: RetryPolicy,
    call_timeout: Duration,
    schema: OutputSchema,
    system: String,
}

impl EvaluationEngine {
    pub fn new(llm: Arc<dyn StructuredCompletion>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            llm,
            retry,
            call_timeout,
            schema: evaluation_schema(),
            system: evaluation_system(),
        }
    }

    pub async fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<Evaluation, PipelineError> {
        if input.transcript.trim().is_empty() {
            return Err(PipelineError::Input("transcript is empty".to_string()));
        }

        let prompt = build_evaluation_prompt(
            input.question_text,
            input.transcript,
            input.job_description_text,
        );

        let mut attempt = 1;
        loop {
            self.retry.wait_before(attempt).await;

            let failure = match self.attempt(&prompt).await {
                Ok(evaluation) => {
                    info!("Evaluation succeeded on attempt {attempt}");
                    return Ok(evaluation);
                }
                Err(failure) => failure,
            };

            if self.retry.has_attempts_after(attempt) {
                warn!(
                    "Evaluation attempt {}/{} failed, retrying: {}",
                    attempt, self.retry.max_attempts, failure
                );
                attempt += 1;
                continue;
            }

            error!("Evaluation failed after {attempt} attempt(s): {failure}");
            return Err(EvaluationError {
                attempts: attempt,
                last: failure,
            }
            .into());
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<Evaluation, AttemptFailure> {
        let value = with_timeout(
            self.call_timeout,
            self.llm.complete_structured(&self.system, prompt, &self.schema),
        )
        .await
        .map_err(|timed_out| LlmError::Timeout(timed_out.0))??;

        validate_evaluation(&value).map_err(AttemptFailure::Schema)
    }
}

//! Response Ledger: append-only record of answer attempts.
//!
//! Each attempt is a Response plus its ResponseScore, written together. Reads are
//! newest first; index 0 is always the latest attempt. Attempt counts are derived
//! from the same rows on every read and never cached.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::evaluation::criteria::Evaluation;
use crate::models::response::{Attempt, NewAttempt};
use crate::storage::InterviewStore;

pub struct ResponseLedger {
    store: Arc<dyn InterviewStore>,
}

impl ResponseLedger {
    pub fn new(store: Arc<dyn InterviewStore>) -> Self {
        Self { store }
    }

    pub async fn record_attempt(
        &self,
        question_id: Uuid,
        user_id: Uuid,
        audio_key: String,
        transcript: String,
        evaluation: Evaluation,
    ) -> Result<Attempt, PipelineError> {
        let attempt = self
            .store
            .insert_attempt(NewAttempt {
                question_id,
                user_id,
                audio_key,
                transcript,
                evaluation,
            })
            .await?;
        info!(
            "Recorded response {} for question {question_id}",
            attempt.response_id
        );
        Ok(attempt)
    }

    pub async fn list_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<Vec<Attempt>, PipelineError> {
        Ok(self.store.list_attempts(question_id, user_id).await?)
    }

    pub async fn attempts_count(&self, question_id: Uuid, user_id: Uuid) -> Result<i64, PipelineError> {
        Ok(self.store.count_attempts(question_id, user_id).await?)
    }
}

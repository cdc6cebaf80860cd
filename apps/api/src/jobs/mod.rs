//! Job descriptions: upload, lifecycle, and question generation.

pub mod generator;
pub mod handlers;
pub mod ingest;
pub mod lease;
pub mod prompts;
pub mod schema;
pub mod status;

use uuid::Uuid;

use crate::errors::PipelineError;
use crate::models::question::QuestionWithAttempts;
use crate::storage::InterviewStore;

/// The question set of a job description that is ready to practise, in creation
/// order with live attempt counts.
pub async fn practice_questions(
    store: &dyn InterviewStore,
    id: Uuid,
    user_id: Uuid,
) -> Result<Vec<QuestionWithAttempts>, PipelineError> {
    let jd = store
        .job_description(id, user_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("job description {id}")))?;

    if !jd.status.is_ready_for_practice() {
        return Err(PipelineError::NotReady { id, status: jd.status });
    }
    Ok(store.list_questions(id, user_id).await?)
}

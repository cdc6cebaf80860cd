use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::evaluation::engine::EvaluationError;
use crate::jobs::status::JobStatus;
use crate::transcription::TranscriberError;

/// Failure taxonomy of the rehearsal pipeline.
///
/// Input errors are reported immediately with no write. Collaborator and storage
/// failures are fatal for the current operation and never leave a partial record.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("audio contained no recognisable speech")]
    EmptyAudio,

    #[error("transcription failed: {0}")]
    TranscriptionFailed(#[source] TranscriberError),

    #[error(transparent)]
    EvaluationFailed(#[from] EvaluationError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("job description {id} is already {status}")]
    AlreadyFinalized { id: Uuid, status: JobStatus },

    #[error("question generation for job description {0} is already in progress")]
    GenerationInProgress(Uuid),

    #[error("job description {id} is {status}; questions are not available")]
    NotReady { id: Uuid, status: JobStatus },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Input(msg) => AppError::Validation(msg),
            PipelineError::EmptyAudio => AppError::UnprocessableEntity(err.to_string()),
            PipelineError::TranscriptionFailed(_) => AppError::Transcription(err.to_string()),
            PipelineError::EvaluationFailed(_) => AppError::Llm(err.to_string()),
            PipelineError::NotFound(_) => AppError::NotFound(err.to_string()),
            PipelineError::AlreadyFinalized { .. }
            | PipelineError::GenerationInProgress(_)
            | PipelineError::NotReady { .. } => AppError::Conflict(err.to_string()),
            PipelineError::Storage(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Transcription(msg) => {
                tracing::error!("Transcription error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TRANSCRIPTION_ERROR",
                    "The audio could not be transcribed".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The response could not be evaluated; please try again".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

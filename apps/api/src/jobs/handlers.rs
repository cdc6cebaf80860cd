use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::{AppError, PipelineError};
use crate::jobs::ingest::JobDescriptionUpload;
use crate::jobs::practice_questions;
use crate::models::job_description::JobDescription;
use crate::models::question::QuestionWithAttempts;
use crate::routes::multipart::MultipartForm;
use crate::routes::UserIdQuery;
use crate::state::AppState;

/// POST /api/v1/job-descriptions
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobDescription>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let upload = JobDescriptionUpload {
        user_id: form.user_id()?,
        company_name: form.text("company_name")?.to_string(),
        job_title: form.text("job_title")?.to_string(),
        file_name: file.file_name.unwrap_or_default(),
        bytes: file.bytes,
    };

    let jd = state.intake.ingest(upload).await?;
    Ok((StatusCode::CREATED, Json(jd)))
}

/// GET /api/v1/job-descriptions
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobDescription>>, AppError> {
    let rows = state
        .store
        .list_job_descriptions(params.user_id)
        .await
        .map_err(PipelineError::from)?;
    Ok(Json(rows))
}

/// GET /api/v1/job-descriptions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobDescription>, AppError> {
    let jd = state
        .store
        .job_description(id, params.user_id)
        .await
        .map_err(PipelineError::from)?
        .ok_or_else(|| PipelineError::NotFound(format!("job description {id}")))?;
    Ok(Json(jd))
}

/// POST /api/v1/job-descriptions/:id/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobDescription>, AppError> {
    let jd = state.generator.generate(id, params.user_id).await?;
    Ok(Json(jd))
}

/// GET /api/v1/job-descriptions/:id/questions
pub async fn handle_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<QuestionWithAttempts>>, AppError> {
    let questions = practice_questions(state.store.as_ref(), id, params.user_id).await?;
    Ok(Json(questions))
}

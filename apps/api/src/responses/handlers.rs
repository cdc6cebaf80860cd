use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::criteria::{Feedback, Scores};
use crate::models::question::QuestionWithAttempts;
use crate::models::response::Attempt;
use crate::responses::submission::Submission;
use crate::routes::multipart::MultipartForm;
use crate::routes::UserIdQuery;
use crate::state::AppState;

/// What a client sees of one attempt.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub transcript: String,
    pub scores: Scores,
    pub feedback: Feedback,
    pub overall_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Attempt> for ResponseView {
    fn from(attempt: Attempt) -> Self {
        Self {
            response_id: attempt.response_id,
            question_id: attempt.question_id,
            transcript: attempt.transcript,
            scores: attempt.scores,
            feedback: attempt.feedback,
            overall_comment: attempt.overall_comment,
            created_at: attempt.created_at,
        }
    }
}

/// POST /api/v1/questions/:id/responses
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResponseView>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let user_id = form.user_id()?;
    let file = form.take_file("audio_file")?;

    let format_hints = file
        .file_name
        .into_iter()
        .chain(file.content_type)
        .collect();

    let attempt = state
        .submissions
        .submit(Submission {
            question_id,
            user_id,
            audio: file.bytes,
            format_hints,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(attempt.into())))
}

/// GET /api/v1/questions/:id/responses
pub async fn handle_list(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResponseView>>, AppError> {
    let attempts = state
        .submissions
        .list_responses(question_id, params.user_id)
        .await?;
    Ok(Json(attempts.into_iter().map(ResponseView::from).collect()))
}

/// GET /api/v1/questions/:id
pub async fn handle_get_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<QuestionWithAttempts>, AppError> {
    let question = state.submissions.question(question_id, params.user_id).await?;
    Ok(Json(question))
}

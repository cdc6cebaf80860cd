pub mod health;
pub mod multipart;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::jobs::handlers as jobs;
use crate::responses::handlers as responses;
use crate::state::AppState;

/// Every route identifies the acting user explicitly.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health::health_handler))
        // Job descriptions
        .route(
            "/api/v1/job-descriptions",
            post(jobs::handle_upload).get(jobs::handle_list),
        )
        .route("/api/v1/job-descriptions/:id", get(jobs::handle_get))
        .route(
            "/api/v1/job-descriptions/:id/generate",
            post(jobs::handle_generate),
        )
        .route(
            "/api/v1/job-descriptions/:id/questions",
            get(jobs::handle_questions),
        )
        // Practice
        .route("/api/v1/questions/:id", get(responses::handle_get_question))
        .route(
            "/api/v1/questions/:id/responses",
            post(responses::handle_submit).get(responses::handle_list),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

//! Persistence seam for the rehearsal pipeline.
//!
//! `PgStore` is the production backend; tests use the in-memory store. Every
//! multi-row write here is a single all-or-nothing unit.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{Question, QuestionWithAttempts};
use crate::models::response::{Attempt, NewAttempt};

pub mod blobs;
#[cfg(test)]
pub mod memory;
pub mod postgres;

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Inserts a job description in `pending`.
    async fn insert_job_description(&self, new: NewJobDescription) -> Result<JobDescription>;

    async fn job_description(&self, id: Uuid, user_id: Uuid) -> Result<Option<JobDescription>>;

    /// The user's job descriptions, newest first.
    async fn list_job_descriptions(&self, user_id: Uuid) -> Result<Vec<JobDescription>>;

    /// Flips `pending → questions_generated` and writes the question set in one unit.
    /// Returns `None` (writing nothing) when the job description is no longer `pending`.
    async fn complete_generation(&self, id: Uuid, questions: &[String]) -> Result<Option<Vec<Question>>>;

    /// Flips `pending → error` with `message`. Returns `false` when it was no longer `pending`.
    async fn fail_generation(&self, id: Uuid, message: &str) -> Result<bool>;

    /// Questions in creation order, each with its live attempt count.
    async fn list_questions(&self, job_description_id: Uuid, user_id: Uuid) -> Result<Vec<QuestionWithAttempts>>;

    async fn question(&self, id: Uuid, user_id: Uuid) -> Result<Option<Question>>;

    /// Writes a response and its score set together, or neither.
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt>;

    /// The user's attempts at a question, most recent first.
    async fn list_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<Vec<Attempt>>;

    async fn count_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<i64>;
}

use anyhow::{ensure, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::jobs::status::JobStatus;
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{Question, QuestionWithAttempts};
use crate::models::response::{Attempt, AttemptRow, NewAttempt};
use crate::storage::InterviewStore;

const ATTEMPT_COLUMNS: &str = r#"
    r.id, r.question_id, r.user_id, r.audio_key, r.transcript, r.created_at,
    s.confidence, s.clarity_structure, s.technical_depth, s.communication_skills, s.relevance,
    s.feedback, s.overall_comment
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn insert_job_description(&self, new: NewJobDescription) -> Result<JobDescription> {
        let row = sqlx::query_as::<_, JobDescription>(
            r#"
            INSERT INTO job_descriptions
                (id, user_id, company_name, job_title, file_key, extracted_text, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.company_name)
        .bind(&new.job_title)
        .bind(&new.file_key)
        .bind(&new.extracted_text)
        .bind(JobStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted job description {} for user {}", row.id, row.user_id);
        Ok(row)
    }

    async fn job_description(&self, id: Uuid, user_id: Uuid) -> Result<Option<JobDescription>> {
        Ok(sqlx::query_as::<_, JobDescription>(
            "SELECT * FROM job_descriptions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_job_descriptions(&self, user_id: Uuid) -> Result<Vec<JobDescription>> {
        Ok(sqlx::query_as::<_, JobDescription>(
            "SELECT * FROM job_descriptions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn complete_generation(&self, id: Uuid, questions: &[String]) -> Result<Option<Vec<Question>>> {
        ensure!(!questions.is_empty(), "refusing to store an empty question set");

        let mut tx = self.pool.begin().await?;

        // Compare-and-set on status: only one writer ever leaves `pending`.
        let owner: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE job_descriptions
            SET status = $2, error_message = NULL
            WHERE id = $1 AND status = $3
            RETURNING user_id
            "#,
        )
        .bind(id)
        .bind(JobStatus::QuestionsGenerated)
        .bind(JobStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = owner else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut created = Vec::with_capacity(questions.len());
        for (position, text) in questions.iter().enumerate() {
            let question = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO questions (id, job_description_id, user_id, position, question_text)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(user_id)
            .bind(i16::try_from(position)?)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;
            created.push(question);
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn fail_generation(&self, id: Uuid, message: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE job_descriptions SET status = $2, error_message = $3 WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(JobStatus::Error)
        .bind(message)
        .bind(JobStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_questions(&self, job_description_id: Uuid, user_id: Uuid) -> Result<Vec<QuestionWithAttempts>> {
        Ok(sqlx::query_as::<_, QuestionWithAttempts>(
            r#"
            SELECT q.*,
                   (SELECT COUNT(*) FROM responses r
                     WHERE r.question_id = q.id AND r.user_id = q.user_id) AS attempts_count
            FROM questions q
            WHERE q.job_description_id = $1 AND q.user_id = $2
            ORDER BY q.position
            "#,
        )
        .bind(job_description_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn question(&self, id: Uuid, user_id: Uuid) -> Result<Option<Question>> {
        Ok(
            sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt> {
        let NewAttempt {
            question_id,
            user_id,
            audio_key,
            transcript,
            evaluation,
        } = attempt;
        let response_id = Uuid::new_v4();
        let scores = &evaluation.scores;

        let mut tx = self.pool.begin().await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO responses (id, question_id, user_id, audio_key, transcript)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
            "#,
        )
        .bind(response_id)
        .bind(question_id)
        .bind(user_id)
        .bind(&audio_key)
        .bind(&transcript)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO response_scores
                (id, response_id, confidence, clarity_structure, technical_depth,
                 communication_skills, relevance, feedback, overall_comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(response_id)
        .bind(i16::from(scores.confidence))
        .bind(i16::from(scores.clarity_structure))
        .bind(i16::from(scores.technical_depth))
        .bind(i16::from(scores.communication_skills))
        .bind(i16::from(scores.relevance))
        .bind(Json(&evaluation.feedback))
        .bind(&evaluation.overall_comment)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Attempt {
            response_id,
            question_id,
            user_id,
            audio_key,
            transcript,
            scores: evaluation.scores,
            feedback: evaluation.feedback,
            overall_comment: evaluation.overall_comment,
            created_at,
        })
    }

    async fn list_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<Vec<Attempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM responses r
            JOIN response_scores s ON s.response_id = r.id
            WHERE r.question_id = $1 AND r.user_id = $2
            ORDER BY r.created_at DESC, r.seq DESC
            "#
        ))
        .bind(question_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Attempt::try_from).collect()
    }

    async fn count_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM responses WHERE question_id = $1 AND user_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

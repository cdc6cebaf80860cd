use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::evaluation::criteria::{Evaluation, Feedback, PerCriterion, Score, Scores};

/// A recorded answer together with its evaluation. Append-only: never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub audio_key: String,
    pub transcript: String,
    pub scores: Scores,
    pub feedback: Feedback,
    pub overall_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to append one attempt to the ledger.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub audio_key: String,
    pub transcript: String,
    pub evaluation: Evaluation,
}

/// Flat join of `responses` and `response_scores`.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub audio_key: String,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
    pub confidence: i16,
    pub clarity_structure: i16,
    pub technical_depth: i16,
    pub communication_skills: i16,
    pub relevance: i16,
    pub feedback: Json<Feedback>,
    pub overall_comment: Option<String>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = anyhow::Error;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let raw = PerCriterion {
            confidence: row.confidence,
            clarity_structure: row.clarity_structure,
            technical_depth: row.technical_depth,
            communication_skills: row.communication_skills,
            relevance: row.relevance,
        };
        let scores = PerCriterion::from_fn(|c| Score::try_from(i64::from(*raw.get(c))).ok())
            .transpose()
            .with_context(|| format!("response {} has a stored score outside 1..=10", row.id))?;

        Ok(Attempt {
            response_id: row.id,
            question_id: row.question_id,
            user_id: row.user_id,
            audio_key: row.audio_key,
            transcript: row.transcript,
            scores,
            feedback: row.feedback.0,
            overall_comment: row.overall_comment,
            created_at: row.created_at,
        })
    }
}

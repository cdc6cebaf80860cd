use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One generated question. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub job_description_id: Uuid,
    /// Denormalised owner, used for access checks without a join.
    pub user_id: Uuid,
    /// 0-based creation order within the job description's question set.
    pub position: i16,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
}

/// A question plus the live count of responses recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionWithAttempts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub question: Question,
    pub attempts_count: i64,
}

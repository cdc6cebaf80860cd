use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::jobs::status::JobStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub file_key: String,
    /// `None` until text extraction succeeds.
    pub extracted_text: Option<String>,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at upload time. Status always starts at `pending`.
#[derive(Debug, Clone)]
pub struct NewJobDescription {
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub file_key: String,
    pub extracted_text: Option<String>,
}

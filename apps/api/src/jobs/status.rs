//! Job description lifecycle.
//!
//! ```text
//! pending ──► questions_generated   (terminal, success)
//!    │
//!    └──────► error                 (terminal, carries a message)
//! ```
//!
//! There are no transitions out of a terminal state. A failed upload is retried by
//! uploading again, never in place.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    QuestionsGenerated,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [
        JobStatus::Pending,
        JobStatus::QuestionsGenerated,
        JobStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::QuestionsGenerated => "questions_generated",
            JobStatus::Error => "error",
        }
    }

    /// A state with no outgoing transition.
    pub fn is_terminal(self) -> bool {
        !Self::ALL.into_iter().any(|next| self.can_transition_to(next))
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::QuestionsGenerated)
                | (JobStatus::Pending, JobStatus::Error)
        )
    }

    /// Questions may be listed and answered only once generation succeeded.
    pub fn is_ready_for_practice(self) -> bool {
        matches!(self, JobStatus::QuestionsGenerated)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! In-memory `InterviewStore` used by the unit tests. Mirrors the Postgres
//! semantics: compare-and-set status flips, all-or-nothing writes, newest-first lists.

use std::sync::Mutex;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::jobs::status::JobStatus;
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{Question, QuestionWithAttempts};
use crate::models::response::{Attempt, NewAttempt};
use crate::storage::InterviewStore;

#[derive(Default)]
struct Tables {
    job_descriptions: Vec<JobDescription>,
    questions: Vec<Question>,
    /// (insertion sequence, attempt)
    attempts: Vec<(u64, Attempt)>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_attempt_writes: Mutex<bool>,
    fail_job_description_writes: Mutex<bool>,
}

impl MemoryStore {
    /// Makes every subsequent `insert_attempt` fail, as a lost database would.
    pub fn fail_attempt_writes(&self) {
        *self.fail_attempt_writes.lock().unwrap() = true;
    }

    /// Makes every subsequent `insert_job_description` fail.
    pub fn fail_job_description_writes(&self) {
        *self.fail_job_description_writes.lock().unwrap() = true;
    }

    pub fn question_count(&self, job_description_id: Uuid) -> usize {
        let tables = self.tables.lock().unwrap();
        tables
            .questions
            .iter()
            .filter(|q| q.job_description_id == job_description_id)
            .count()
    }

    pub fn attempt_count(&self) -> usize {
        self.tables.lock().unwrap().attempts.len()
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn insert_job_description(&self, new: NewJobDescription) -> Result<JobDescription> {
        ensure!(
            !*self.fail_job_description_writes.lock().unwrap(),
            "connection reset while inserting job description"
        );
        let row = JobDescription {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            company_name: new.company_name,
            job_title: new.job_title,
            file_key: new.file_key,
            extracted_text: new.extracted_text,
            status: JobStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().job_descriptions.push(row.clone());
        Ok(row)
    }

    async fn job_description(&self, id: Uuid, user_id: Uuid) -> Result<Option<JobDescription>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .job_descriptions
            .iter()
            .find(|jd| jd.id == id && jd.user_id == user_id)
            .cloned())
    }

    async fn list_job_descriptions(&self, user_id: Uuid) -> Result<Vec<JobDescription>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .job_descriptions
            .iter()
            .filter(|jd| jd.user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn complete_generation(&self, id: Uuid, questions: &[String]) -> Result<Option<Vec<Question>>> {
        ensure!(!questions.is_empty(), "refusing to store an empty question set");
        let mut tables = self.tables.lock().unwrap();

        let jd = tables
            .job_descriptions
            .iter_mut()
            .find(|jd| jd.id == id)
            .ok_or_else(|| anyhow!("job description {id} does not exist"))?;
        if jd.status != JobStatus::Pending {
            return Ok(None);
        }
        jd.status = JobStatus::QuestionsGenerated;
        jd.error_message = None;
        let user_id = jd.user_id;

        let now = Utc::now();
        let created: Vec<Question> = questions
            .iter()
            .enumerate()
            .map(|(position, text)| Question {
                id: Uuid::new_v4(),
                job_description_id: id,
                user_id,
                position: position as i16,
                question_text: text.clone(),
                created_at: now,
            })
            .collect();
        tables.questions.extend(created.iter().cloned());
        Ok(Some(created))
    }

    async fn fail_generation(&self, id: Uuid, message: &str) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let jd = tables
            .job_descriptions
            .iter_mut()
            .find(|jd| jd.id == id)
            .ok_or_else(|| anyhow!("job description {id} does not exist"))?;
        if jd.status != JobStatus::Pending {
            return Ok(false);
        }
        jd.status = JobStatus::Error;
        jd.error_message = Some(message.to_string());
        Ok(true)
    }

    async fn list_questions(&self, job_description_id: Uuid, user_id: Uuid) -> Result<Vec<QuestionWithAttempts>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .questions
            .iter()
            .filter(|q| q.job_description_id == job_description_id && q.user_id == user_id)
            .map(|q| QuestionWithAttempts {
                question: q.clone(),
                attempts_count: tables
                    .attempts
                    .iter()
                    .filter(|(_, a)| a.question_id == q.id && a.user_id == q.user_id)
                    .count() as i64,
            })
            .collect();
        rows.sort_by_key(|row| row.question.position);
        Ok(rows)
    }

    async fn question(&self, id: Uuid, user_id: Uuid) -> Result<Option<Question>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .questions
            .iter()
            .find(|q| q.id == id && q.user_id == user_id)
            .cloned())
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt> {
        ensure!(
            !*self.fail_attempt_writes.lock().unwrap(),
            "simulated storage outage"
        );
        let mut tables = self.tables.lock().unwrap();
        ensure!(
            tables.questions.iter().any(|q| q.id == attempt.question_id),
            "question {} does not exist",
            attempt.question_id
        );

        let record = Attempt {
            response_id: Uuid::new_v4(),
            question_id: attempt.question_id,
            user_id: attempt.user_id,
            audio_key: attempt.audio_key,
            transcript: attempt.transcript,
            scores: attempt.evaluation.scores,
            feedback: attempt.evaluation.feedback,
            overall_comment: attempt.evaluation.overall_comment,
            created_at: Utc::now(),
        };
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.attempts.push((seq, record.clone()));
        Ok(record)
    }

    async fn list_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<Vec<Attempt>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .attempts
            .iter()
            .filter(|(_, a)| a.question_id == question_id && a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(rows.into_iter().map(|(_, attempt)| attempt).collect())
    }

    async fn count_attempts(&self, question_id: Uuid, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attempts
            .iter()
            .filter(|(_, a)| a.question_id == question_id && a.user_id == user_id)
            .count() as i64)
    }
}

//! Response submission: validate → transcribe → evaluate → store audio → record.
//!
//! Strictly sequential per submission. Nothing is written until both collaborators
//! have succeeded, so a failed transcription or evaluation leaves no trace. If the
//! ledger write itself fails, the freshly stored audio is removed again.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::evaluation::engine::{EvaluationEngine, EvaluationInput};
use crate::models::question::{Question, QuestionWithAttempts};
use crate::models::response::Attempt;
use crate::responses::ledger::ResponseLedger;
use crate::storage::blobs::{response_audio_key, BlobStore};
use crate::storage::InterviewStore;
use crate::transcription::{AudioFormat, TranscriptionAdapter};

pub struct Submission {
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub audio: Bytes,
    /// File name or MIME type declared by the client.
    pub format_hints: Vec<String>,
}

pub struct SubmissionPipeline {
    store: Arc<dyn InterviewStore>,
    blobs: Arc<dyn BlobStore>,
    transcription: TranscriptionAdapter,
    evaluation: EvaluationEngine,
    ledger: ResponseLedger,
    max_audio_bytes: usize,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        blobs: Arc<dyn BlobStore>,
        transcription: TranscriptionAdapter,
        evaluation: EvaluationEngine,
        max_audio_bytes: usize,
    ) -> Self {
        Self {
            ledger: ResponseLedger::new(store.clone()),
            store,
            blobs,
            transcription,
            evaluation,
            max_audio_bytes,
        }
    }

    pub async fn submit(&self, submission: Submission) -> Result<Attempt, PipelineError> {
        let Submission {
            question_id,
            user_id,
            audio,
            format_hints,
        } = submission;

        if audio.is_empty() {
            return Err(PipelineError::EmptyAudio);
        }
        if audio.len() > self.max_audio_bytes {
            return Err(PipelineError::Input(format!(
                "audio exceeds the {} byte limit",
                self.max_audio_bytes
            )));
        }
        let format = format_hints
            .iter()
            .find_map(|hint| AudioFormat::from_hint(hint))
            .ok_or_else(|| PipelineError::Input("unsupported audio format".to_string()))?;

        let question = self.owned_question(question_id, user_id).await?;
        let job_description_text = self
            .store
            .job_description(question.job_description_id, user_id)
            .await?
            .and_then(|jd| jd.extracted_text);

        let transcript = self.transcription.transcribe(&audio, format).await?;

        let evaluation = self
            .evaluation
            .evaluate(&EvaluationInput {
                question_text: &question.question_text,
                transcript: &transcript,
                job_description_text: job_description_text.as_deref(),
            })
            .await?;

        let audio_key = response_audio_key(user_id, question_id, format);
        self.blobs
            .put(&audio_key, audio, format.mime_type())
            .await?;

        match self
            .ledger
            .record_attempt(question_id, user_id, audio_key.clone(), transcript, evaluation)
            .await
        {
            Ok(attempt) => {
                info!(
                    "Submission for question {question_id} stored as response {}",
                    attempt.response_id
                );
                Ok(attempt)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&audio_key).await {
                    warn!("Failed to remove orphaned audio {audio_key}: {cleanup}");
                }
                Err(e)
            }
        }
    }

    /// Prior attempts at a question owned by `user_id`, newest first.
    pub async fn list_responses(&self, question_id: Uuid, user_id: Uuid) -> Result<Vec<Attempt>, PipelineError> {
        self.owned_question(question_id, user_id).await?;
        self.ledger.list_attempts(question_id, user_id).await
    }

    /// One question with its live attempt count.
    pub async fn question(&self, question_id: Uuid, user_id: Uuid) -> Result<QuestionWithAttempts, PipelineError> {
        let question = self.owned_question(question_id, user_id).await?;
        let attempts_count = self.ledger.attempts_count(question_id, user_id).await?;
        Ok(QuestionWithAttempts {
            question,
            attempts_count,
        })
    }

    async fn owned_question(&self, question_id: Uuid, user_id: Uuid) -> Result<Question, PipelineError> {
        self.store
            .question(question_id, user_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("question {question_id}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::evaluation::engine::EvaluationError;
    use crate::llm_client::LlmError;
    use crate::models::job_description::NewJobDescription;
    use crate::retry::RetryPolicy;
    use crate::storage::memory::MemoryStore;
    use crate::testing::{evaluation_json, FixedTranscriber, MemoryBlobs, ScriptedCompletion, FIVE_QUESTIONS};

    const TRANSCRIPT: &str = "I led a team through a crisis...";

    struct Harness {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobs>,
        llm: Arc<ScriptedCompletion>,
        pipeline: SubmissionPipeline,
        question_id: Uuid,
        user_id: Uuid,
    }

    async fn harness(transcriber: FixedTranscriber, script: Vec<Result<Value, LlmError>>) -> Harness {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(MemoryBlobs::default());
        let llm = Arc::new(ScriptedCompletion::new(script));

        let user_id = Uuid::new_v4();
        let jd = store
            .insert_job_description(NewJobDescription {
                user_id,
                company_name: "Acme".to_string(),
                job_title: "Engineering Manager".to_string(),
                file_key: "job-descriptions/jd.pdf".to_string(),
                extracted_text: Some("Lead incident response for the payments team.".to_string()),
            })
            .await
            .unwrap();
        let texts: Vec<String> = FIVE_QUESTIONS.iter().map(|q| q.to_string()).collect();
        let questions = store.complete_generation(jd.id, &texts).await.unwrap().unwrap();

        let pipeline = SubmissionPipeline::new(
            store.clone(),
            blobs.clone(),
            TranscriptionAdapter::new(Arc::new(transcriber), Duration::from_secs(5)),
            EvaluationEngine::new(llm.clone(), RetryPolicy::new(2, Duration::ZERO), Duration::from_secs(5)),
            1024,
        );

        Harness {
            store,
            blobs,
            llm,
            pipeline,
            question_id: questions[0].id,
            user_id,
        }
    }

    fn submission(h: &Harness, audio: &'static [u8]) -> Submission {
        Submission {
            question_id: h.question_id,
            user_id: h.user_id,
            audio: Bytes::from_static(audio),
            format_hints: vec!["answer.webm".to_string()],
        }
    }

    #[tokio::test]
    async fn test_whitespace_transcript_stores_nothing() {
        let h = harness(FixedTranscriber::text("   "), vec![]).await;

        let err = h.pipeline.submit(submission(&h, b"audio")).await.unwrap_err();

        assert!(matches!(err, PipelineError::EmptyAudio));
        assert_eq!(h.store.attempt_count(), 0);
        assert!(h.blobs.keys().is_empty());
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_submission_is_latest_attempt() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![Ok(evaluation_json([8, 7, 6, 9, 8]))],
        )
        .await;

        let attempt = h.pipeline.submit(submission(&h, b"audio")).await.unwrap();

        assert_eq!(attempt.transcript, TRANSCRIPT);
        let scores: Vec<u8> = attempt.scores.iter().map(|(_, s)| s.value()).collect();
        assert_eq!(scores, vec![8, 7, 6, 9, 8]);
        assert_eq!(attempt.feedback.confidence, "Feedback on confidence.");

        let history = h.pipeline.list_responses(h.question_id, h.user_id).await.unwrap();
        assert_eq!(history[0], attempt);
        assert_eq!(h.blobs.keys(), vec![attempt.audio_key.clone()]);
        assert!(attempt.audio_key.ends_with(".webm"));
    }

    #[tokio::test]
    async fn test_invalid_first_evaluation_leaves_no_trace() {
        let mut invalid = evaluation_json([8, 7, 6, 9, 8]);
        invalid["scores"]["confidence"] = json!(11);
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![Ok(invalid), Ok(evaluation_json([6, 6, 7, 7, 8]))],
        )
        .await;

        let attempt = h.pipeline.submit(submission(&h, b"audio")).await.unwrap();

        assert_eq!(attempt.scores.confidence.value(), 6);
        assert_eq!(h.store.attempt_count(), 1);
        assert_eq!(h.llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_evaluation_failure_stores_nothing() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![
                Err(LlmError::SchemaViolation("no tool call".to_string())),
                Err(LlmError::RateLimited { retries: 3 }),
            ],
        )
        .await;

        let err = h.pipeline.submit(submission(&h, b"audio")).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::EvaluationFailed(EvaluationError { attempts: 2, .. })
        ));
        assert_eq!(h.store.attempt_count(), 0);
        assert!(h.blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn test_transcription_failure_stores_nothing() {
        let h = harness(FixedTranscriber::failing("corrupt capture"), vec![]).await;

        let err = h.pipeline.submit(submission(&h, b"audio")).await.unwrap_err();

        assert!(matches!(err, PipelineError::TranscriptionFailed(_)));
        assert_eq!(h.store.attempt_count(), 0);
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_removes_uploaded_audio() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![Ok(evaluation_json([5, 5, 5, 5, 5]))],
        )
        .await;
        h.store.fail_attempt_writes();

        let err = h.pipeline.submit(submission(&h, b"audio")).await.unwrap_err();

        assert!(matches!(err, PipelineError::Storage(_)));
        assert!(h.blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn test_evaluation_prompt_carries_job_context() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![Ok(evaluation_json([5, 5, 5, 5, 5]))],
        )
        .await;

        h.pipeline.submit(submission(&h, b"audio")).await.unwrap();

        let prompt = &h.llm.prompts()[0];
        assert!(prompt.contains(FIVE_QUESTIONS[0]));
        assert!(prompt.contains("Lead incident response"));
        assert!(prompt.ends_with(TRANSCRIPT));
    }

    #[tokio::test]
    async fn test_input_checks_run_before_collaborators() {
        let transcriber = FixedTranscriber::text(TRANSCRIPT);
        let calls = transcriber.calls.clone();
        let h = harness(transcriber, vec![]).await;

        let empty = h.pipeline.submit(submission(&h, b"")).await.unwrap_err();
        assert!(matches!(empty, PipelineError::EmptyAudio));

        let mut unknown = submission(&h, b"audio");
        unknown.format_hints = vec!["answer.txt".to_string(), "text/plain".to_string()];
        let err = h.pipeline.submit(unknown).await.unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));

        let oversized = Submission {
            audio: Bytes::from(vec![1u8; 2048]),
            ..submission(&h, b"")
        };
        let err = h.pipeline.submit(oversized).await.unwrap_err();
        assert!(matches!(err, PipelineError::Input(msg) if msg.contains("1024")));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mime_type_hint_is_accepted() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![Ok(evaluation_json([5, 5, 5, 5, 5]))],
        )
        .await;
        let mut request = submission(&h, b"audio");
        request.format_hints = vec!["blob".to_string(), "audio/ogg;codecs=opus".to_string()];

        let attempt = h.pipeline.submit(request).await.unwrap();
        assert!(attempt.audio_key.ends_with(".ogg"));
    }

    #[tokio::test]
    async fn test_other_users_question_is_not_found() {
        let h = harness(FixedTranscriber::text(TRANSCRIPT), vec![]).await;
        let mut request = submission(&h, b"audio");
        request.user_id = Uuid::new_v4();

        let err = h.pipeline.submit(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));

        let err = h
            .pipeline
            .list_responses(h.question_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attempts_count_follows_submissions() {
        let h = harness(
            FixedTranscriber::text(TRANSCRIPT),
            vec![
                Ok(evaluation_json([5, 5, 5, 5, 5])),
                Ok(evaluation_json([7, 7, 7, 7, 7])),
            ],
        )
        .await;

        h.pipeline.submit(submission(&h, b"first")).await.unwrap();
        let latest = h.pipeline.submit(submission(&h, b"second")).await.unwrap();

        let question = h.store.question(h.question_id, h.user_id).await.unwrap().unwrap();
        let questions = h
            .store
            .list_questions(question.job_description_id, h.user_id)
            .await
            .unwrap();
        assert_eq!(questions[0].attempts_count, 2);
        assert!(questions[1..].iter().all(|q| q.attempts_count == 0));

        let history = h.pipeline.list_responses(h.question_id, h.user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].response_id, latest.response_id);

        let single = h.pipeline.question(h.question_id, h.user_id).await.unwrap();
        assert_eq!(single.attempts_count, history.len() as i64);
    }
}

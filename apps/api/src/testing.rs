//! Scripted collaborators and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Map, Value};

use crate::evaluation::criteria::Criterion;
use crate::extraction::{ExtractionError, TextExtractor};
use crate::llm_client::{LlmError, OutputSchema, StructuredCompletion};
use crate::storage::blobs::BlobStore;
use crate::transcription::{AudioFormat, Transcriber, TranscriberError};

/// Replays a fixed list of outcomes, one per call. Calls past the end fail.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<Value, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<Value, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredCompletion for ScriptedCompletion {
    async fn complete_structured(
        &self,
        _system: &str,
        prompt: &str,
        _schema: &OutputSchema,
    ) -> Result<Value, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::SchemaViolation("script exhausted".to_string())))
    }
}

/// Never answers.
#[derive(Default)]
pub struct HangingCompletion {
    calls: AtomicUsize,
}

impl HangingCompletion {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredCompletion for HangingCompletion {
    async fn complete_structured(
        &self,
        _system: &str,
        _prompt: &str,
        _schema: &OutputSchema,
    ) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

pub struct FixedTranscriber {
    outcome: Result<String, String>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedTranscriber {
    pub fn text(transcript: &str) -> Self {
        Self {
            outcome: Ok(transcript.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            outcome: Err(cause.to_string()),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _format: AudioFormat) -> Result<String, TranscriberError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(TranscriberError::Unreadable)
    }
}

/// Blob store that remembers what it holds.
#[derive(Default)]
pub struct MemoryBlobs {
    objects: Mutex<Vec<(String, Bytes)>>,
    fail_puts: Mutex<bool>,
}

impl MemoryBlobs {
    pub fn fail_puts(&self) {
        *self.fail_puts.lock().unwrap() = true;
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<()> {
        if *self.fail_puts.lock().unwrap() {
            bail!("simulated upload failure");
        }
        self.objects.lock().unwrap().push((key.to_string(), bytes));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().retain(|(k, _)| k != key);
        Ok(())
    }
}

/// A schema-conforming evaluation with `scores` in criterion order.
pub fn evaluation_json(scores: [u8; 5]) -> Value {
    let mut score_map = Map::new();
    let mut feedback_map = Map::new();
    for (criterion, score) in Criterion::ALL.iter().zip(scores) {
        score_map.insert(criterion.key().to_string(), json!(score));
        feedback_map.insert(
            criterion.key().to_string(),
            json!(format!("Feedback on {criterion}.")),
        );
    }
    json!({
        "scores": score_map,
        "feedback": feedback_map,
        "overall_comment": "Solid answer; quantify the outcome next time.",
    })
}

pub fn questions_json(questions: &[&str]) -> Value {
    json!({ "questions": questions })
}

pub const FIVE_QUESTIONS: [&str; 5] = [
    "Tell me about a time you handled a crisis.",
    "Describe a conflict with a teammate and how you resolved it.",
    "Give an example of a goal you set and how you reached it.",
    "Tell me about a time you failed and what you learned.",
    "Describe a situation where you had to persuade a stakeholder.",
];

/// The smallest byte string that passes the PDF signature check.
pub fn pdf_bytes() -> Bytes {
    Bytes::from_static(b"%PDF-1.4\n%%EOF\n")
}

/// Returns canned text (or an unreadable-PDF failure) without parsing anything.
pub struct FixedExtractor(pub Option<&'static str>);

#[async_trait]
impl TextExtractor for FixedExtractor {
    async fn extract(&self, _bytes: Bytes) -> Result<String, ExtractionError> {
        self.0
            .map(String::from)
            .ok_or_else(|| ExtractionError::Unreadable("no text layer".to_string()))
    }
}

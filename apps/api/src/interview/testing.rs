//! Test doubles for the reasoning service and the session store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::interview::evaluator::ScreeningEvaluator;
use crate::interview::models::SessionRecord;
use crate::interview::question_bank::QuestionBank;
use crate::interview::reasoning::{ReasoningError, ReasoningService, Turn};
use crate::interview::session::InterviewServices;
use crate::store::{SessionStore, StorageError};

/// Replays canned responses in order; `EmptyResponse` once exhausted.
pub struct ScriptedReasoning {
    responses: Mutex<VecDeque<Result<String, ReasoningError>>>,
    calls: AtomicUsize,
}

impl ScriptedReasoning {
    pub fn new(responses: Vec<Result<String, ReasoningError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn generate(&self, _prompt: &str, _context: &[Turn]) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ReasoningError::EmptyResponse))
    }
}

/// Answers by prompt kind, so whole interviews can run without scripting every call.
pub struct FakeInterviewer {
    pub score: u8,
    pub fail_everything: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeInterviewer {
    pub fn scoring(score: u8) -> Self {
        Self {
            score,
            fail_everything: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            score: 0,
            fail_everything: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for FakeInterviewer {
    async fn generate(&self, prompt: &str, _context: &[Turn]) -> Result<String, ReasoningError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.fail_everything {
            return Err(ReasoningError::Service("connection refused".to_string()));
        }
        if prompt.contains("SCORE:") {
            return Ok(format!(
                "ACKNOWLEDGMENT: Thanks for the answer.\nSCORE: {}\nFEEDBACK: Reasonable.",
                self.score
            ));
        }
        if prompt.contains("REASONING:") {
            return Ok("REASONING: Synthesized rationale.\nMESSAGE: Thanks for your time.".to_string());
        }
        if prompt.contains("seed interview questions") {
            // Unusable list: the seeds are kept verbatim.
            return Ok("Sure!".to_string());
        }
        Ok("Hi! I'm the Hiring Assistant. What's your full name?".to_string())
    }
}

#[derive(Default)]
pub struct RecordingStore {
    pub records: Mutex<Vec<SessionRecord>>,
}

impl RecordingStore {
    pub fn saved(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn save(&self, record: &SessionRecord) -> Result<String, StorageError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(format!("memory://{}", record.session_id))
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(self.saved())
    }
}

pub struct FailingStore;

#[async_trait]
impl SessionStore for FailingStore {
    async fn save(&self, _record: &SessionRecord) -> Result<String, StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        )))
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(vec![])
    }
}

pub fn services(
    reasoning: Arc<dyn ReasoningService>,
    store: Arc<dyn SessionStore>,
    min_questions: usize,
    max_questions: usize,
) -> Arc<InterviewServices> {
    Arc::new(InterviewServices {
        reasoning,
        store,
        question_bank: QuestionBank::default(),
        evaluator: ScreeningEvaluator::new(6.0, Duration::ZERO),
        min_questions,
        max_questions,
        retry_backoff: Duration::ZERO,
    })
}

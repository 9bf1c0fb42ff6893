//! Interview Session: the conversation state machine.
//!
//! Forward order:
//! GREETING → COLLECT_NAME → COLLECT_EMAIL → COLLECT_PHONE → COLLECT_EXPERIENCE →
//! COLLECT_POSITION → COLLECT_LOCATION → COLLECT_TECH_STACK → ASK_QUESTIONS →
//! CONCLUSION → ENDED
//!
//! An exit keyword jumps from any state before CONCLUSION straight to CONCLUSION.
//! Each call to `handle_input` produces exactly one `Reply`; it never fails. Invalid
//! input leaves state and data untouched, and reasoning-service failures degrade to
//! fallback text.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::interview::evaluator::ScreeningEvaluator;
use crate::interview::models::{
    AnswerEvaluation, Anomaly, CandidateProfile, ScreeningDecision, SessionRecord,
    TechnicalQuestion,
};
use crate::interview::prompts::{self, PromptRequest};
use crate::interview::question_bank::QuestionBank;
use crate::interview::reasoning::{generate_with_retry, Generated, ReasoningService, Turn};
use crate::interview::validators::{
    validate_email, validate_experience, validate_location, validate_name, validate_phone,
    validate_position, validate_tech_stack, ValidationError,
};
use crate::store::SessionStore;

/// Whole-input keywords (case-insensitive) that end the interview early.
pub const EXIT_KEYWORDS: &[&str] = &[
    "exit", "quit", "bye", "goodbye", "stop", "end", "cancel", "leave", "close", "terminate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    Greeting,
    CollectName,
    CollectEmail,
    CollectPhone,
    CollectExperience,
    CollectPosition,
    CollectLocation,
    CollectTechStack,
    AskQuestions,
    Conclusion,
    Ended,
}

impl InterviewState {
    /// Next state in the forward order. `Ended` is its own successor.
    pub fn next(self) -> Self {
        use InterviewState::*;
        match self {
            Greeting => CollectName,
            CollectName => CollectEmail,
            CollectEmail => CollectPhone,
            CollectPhone => CollectExperience,
            CollectExperience => CollectPosition,
            CollectPosition => CollectLocation,
            CollectLocation => CollectTechStack,
            CollectTechStack => AskQuestions,
            AskQuestions => Conclusion,
            Conclusion | Ended => Ended,
        }
    }

    pub fn is_collecting(self) -> bool {
        use InterviewState::*;
        matches!(
            self,
            CollectName
                | CollectEmail
                | CollectPhone
                | CollectExperience
                | CollectPosition
                | CollectLocation
                | CollectTechStack
        )
    }
}

/// Contract violations inside the machine. Logged and answered with a fixed message.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("input received after the session ended")]
    SessionClosed,

    #[error("question cursor {cursor} is past the last of {total} questions")]
    CursorOverflow { cursor: usize, total: usize },

    #[error("conclusion requested while in state {0:?}")]
    NotConcluding(InterviewState),
}

/// Collaborators shared by every session. Immutable once built.
pub struct InterviewServices {
    pub reasoning: Arc<dyn ReasoningService>,
    pub store: Arc<dyn SessionStore>,
    pub question_bank: QuestionBank,
    pub evaluator: ScreeningEvaluator,
    pub min_questions: usize,
    pub max_questions: usize,
    pub retry_backoff: Duration,
}

/// One response to one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub state: InterviewState,
    /// False when the input was rejected and the same field is asked again.
    pub accepted: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: InterviewState,
    pub profile: CandidateProfile,
    pub profile_complete: bool,
    pub total_questions: usize,
    pub answered: usize,
    pub current_question: Option<TechnicalQuestion>,
    pub retry_count: u32,
    pub early_exit: bool,
    pub decision: Option<ScreeningDecision>,
    pub anomalies: Vec<Anomaly>,
    pub created_at: DateTime<Utc>,
}

pub struct InterviewSession {
    id: Uuid,
    services: Arc<InterviewServices>,
    state: InterviewState,
    profile: CandidateProfile,
    questions: Vec<TechnicalQuestion>,
    cursor: usize,
    evaluations: Vec<AnswerEvaluation>,
    decision: Option<ScreeningDecision>,
    candidate_message: Option<String>,
    early_exit: bool,
    retry_count: u32,
    transcript: Vec<Turn>,
    anomalies: Vec<Anomaly>,
    record: Option<SessionRecord>,
    created_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(id: Uuid, services: Arc<InterviewServices>) -> Self {
        Self {
            id,
            services,
            state: InterviewState::Greeting,
            profile: CandidateProfile::default(),
            questions: Vec::new(),
            cursor: 0,
            evaluations: Vec::new(),
            decision: None,
            candidate_message: None,
            early_exit: false,
            retry_count: 0,
            transcript: Vec::new(),
            anomalies: Vec::new(),
            record: None,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    pub fn questions(&self) -> &[TechnicalQuestion] {
        &self.questions
    }

    pub fn evaluations(&self) -> &[AnswerEvaluation] {
        &self.evaluations
    }

    pub fn decision(&self) -> Option<&ScreeningDecision> {
        self.decision.as_ref()
    }

    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// The record built at conclusion, kept even if persisting it failed.
    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    pub fn current_question(&self) -> Option<&TechnicalQuestion> {
        match self.state {
            InterviewState::AskQuestions => self.questions.get(self.cursor),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            profile: self.profile.clone(),
            profile_complete: self.profile.is_complete(),
            total_questions: self.questions.len(),
            answered: self.evaluations.len(),
            current_question: self.current_question().cloned(),
            retry_count: self.retry_count,
            early_exit: self.early_exit,
            decision: self.decision.clone(),
            anomalies: self.anomalies.clone(),
            created_at: self.created_at,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Entry points
    // ────────────────────────────────────────────────────────────────────────

    /// Produces the greeting and moves to COLLECT_NAME.
    pub async fn start(&mut self) -> Reply {
        if self.state != InterviewState::Greeting {
            return self.reprompt_current();
        }

        let services = Arc::clone(&self.services);
        let generated = generate_with_retry(
            services.reasoning.as_ref(),
            &PromptRequest::Greeting,
            &self.transcript,
            services.retry_backoff,
        )
        .await;

        let mut warnings = Vec::new();
        self.note_failure("greeting", &generated, &mut warnings);
        let greeting = generated.or_fallback(prompts::FALLBACK_GREETING);

        self.state = InterviewState::CollectName;
        self.transcript.push(Turn::assistant(&greeting));
        info!("Session {} started", self.id);

        self.reply(greeting, true, warnings)
    }

    pub async fn handle_input(&mut self, raw_text: &str) -> Reply {
        let input = raw_text.trim();

        if self.state == InterviewState::Ended {
            debug!("Session {}: {}", self.id, StateError::SessionClosed);
            return self.reply(prompts::SESSION_CLOSED_MESSAGE.to_string(), false, vec![]);
        }

        if self.state != InterviewState::Conclusion && is_exit_keyword(input) {
            return self.exit_early(input).await;
        }

        match self.state {
            InterviewState::Greeting => self.start().await,
            InterviewState::AskQuestions => self.answer(input).await,
            InterviewState::Conclusion => self.conclude().await,
            InterviewState::Ended => {
                self.reply(prompts::SESSION_CLOSED_MESSAGE.to_string(), false, vec![])
            }
            state if state.is_collecting() => self.collect(input).await,
            _ => self.reprompt_current(),
        }
    }

    /// CONCLUSION step: finalize the decision, persist the record, move to ENDED.
    pub async fn conclude(&mut self) -> Reply {
        match self.state {
            InterviewState::Conclusion => {}
            InterviewState::Ended => {
                return self.reply(prompts::SESSION_CLOSED_MESSAGE.to_string(), false, vec![]);
            }
            other => {
                error!("Session {}: {}", self.id, StateError::NotConcluding(other));
                return self.reply(prompts::INTERNAL_STATE_MESSAGE.to_string(), false, vec![]);
            }
        }

        let mut warnings = Vec::new();
        if self.decision.is_none() {
            let complete = !self.early_exit && self.cursor >= self.questions.len();
            self.decide(complete, &mut warnings).await;
        }
        let decision = match self.decision.clone() {
            Some(decision) => decision,
            None => self.services.evaluator.compute_decision(&self.evaluations, false),
        };

        let record = SessionRecord::new(
            self.id,
            self.profile.clone(),
            &self.questions,
            &self.evaluations,
            decision.clone(),
            self.early_exit,
            self.anomalies.clone(),
        );

        match self.services.store.save(&record).await {
            Ok(location) => info!("Session {} record saved to {}", self.id, location),
            Err(e) => {
                error!("Session {} record could not be saved: {}", self.id, e);
                warnings.push(format!(
                    "Your screening results could not be saved ({e}). Please contact the hiring team."
                ));
            }
        }
        self.record = Some(record);

        let message = self.closing_message(&decision);
        self.state = InterviewState::Ended;
        self.transcript.push(Turn::assistant(&message));
        info!(
            "Session {} ended: {} ({:.1}/10, early_exit={})",
            self.id,
            decision.outcome.label(),
            decision.overall_score,
            self.early_exit
        );

        self.reply(message, true, warnings)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Transitions
    // ────────────────────────────────────────────────────────────────────────

    async fn exit_early(&mut self, input: &str) -> Reply {
        info!(
            "Session {} exit requested in {:?} after {} answer(s)",
            self.id,
            self.state,
            self.evaluations.len()
        );
        self.early_exit = true;
        self.state = InterviewState::Conclusion;

        let mut warnings = Vec::new();
        self.decide(false, &mut warnings).await;

        let message = prompts::EXIT_MESSAGE.to_string();
        self.transcript.push(Turn::user(input));
        self.transcript.push(Turn::assistant(&message));
        self.reply(message, true, warnings)
    }

    async fn collect(&mut self, input: &str) -> Reply {
        let result = match self.state {
            InterviewState::CollectName => validate_name(input).map(|name| {
                self.profile.name = Some(name);
                prompts::email_prompt(self.profile.first_name())
            }),
            InterviewState::CollectEmail => validate_email(input).map(|email| {
                self.profile.email = Some(email);
                prompts::PHONE_PROMPT.to_string()
            }),
            InterviewState::CollectPhone => validate_phone(input).map(|phone| {
                self.profile.phone = Some(phone);
                prompts::EXPERIENCE_PROMPT.to_string()
            }),
            InterviewState::CollectExperience => validate_experience(input).map(|years| {
                self.profile.years_experience = Some(years);
                prompts::POSITION_PROMPT.to_string()
            }),
            InterviewState::CollectPosition => validate_position(input).map(|position| {
                self.profile.desired_position = Some(position);
                prompts::LOCATION_PROMPT.to_string()
            }),
            InterviewState::CollectLocation => validate_location(input).map(|location| {
                self.profile.location = Some(location);
                prompts::TECH_STACK_PROMPT.to_string()
            }),
            InterviewState::CollectTechStack => match validate_tech_stack(input) {
                Ok(stack) => return self.begin_questions(input, stack).await,
                Err(e) => Err(e),
            },
            _ => return self.reprompt_current(),
        };

        match result {
            Ok(next_prompt) => {
                self.retry_count = 0;
                self.advance(input, next_prompt, Vec::new())
            }
            Err(e) => self.reject(e),
        }
    }

    async fn begin_questions(&mut self, input: &str, stack: Vec<String>) -> Reply {
        self.profile.tech_stack = stack;
        self.retry_count = 0;

        let services = Arc::clone(&self.services);
        let seeds = services.question_bank.generate(
            &self.profile.tech_stack,
            self.profile.years_experience.unwrap_or(0.0),
            services.min_questions,
            services.max_questions,
        );

        let mut warnings = Vec::new();
        self.questions = self.tailor_questions(seeds, &mut warnings).await;
        self.cursor = 0;
        info!(
            "Session {} generated {} question(s) for [{}]",
            self.id,
            self.questions.len(),
            self.profile.tech_stack_display()
        );

        let intro = prompts::technical_intro(&self.profile.tech_stack_display(), self.questions.len());
        match self.questions.first() {
            Some(first) => {
                let message = format!("{intro}\n\n{}", prompts::question_prompt(first, self.questions.len()));
                self.advance(input, message, warnings)
            }
            None => {
                warn!("Session {} has no questions to ask", self.id);
                self.state = InterviewState::Conclusion;
                self.decide(true, &mut warnings).await;
                self.transcript.push(Turn::user(input));
                self.reply(intro, true, warnings)
            }
        }
    }

    /// Asks the reasoning service to tailor the seed questions. Falls back to the
    /// seeds when the call fails or the reply does not hold exactly one line per seed.
    async fn tailor_questions(
        &mut self,
        seeds: Vec<TechnicalQuestion>,
        warnings: &mut Vec<String>,
    ) -> Vec<TechnicalQuestion> {
        if seeds.is_empty() {
            return seeds;
        }

        let services = Arc::clone(&self.services);
        let request = PromptRequest::QuestionGen {
            profile: &self.profile,
            seeds: &seeds,
        };
        let generated = generate_with_retry(
            services.reasoning.as_ref(),
            &request,
            &self.transcript,
            services.retry_backoff,
        )
        .await;
        self.note_failure("question_gen", &generated, warnings);

        let Generated::Text(text) = generated else {
            return seeds;
        };

        let tailored = prompts::parse_question_lines(&text);
        if tailored.len() != seeds.len() {
            self.anomalies.push(Anomaly::new(
                "question_gen",
                format!("expected {} questions, parsed {}", seeds.len(), tailored.len()),
            ));
            return seeds;
        }

        seeds
            .into_iter()
            .zip(tailored)
            .map(|(seed, question_text)| TechnicalQuestion {
                question_text,
                ..seed
            })
            .collect()
    }

    async fn answer(&mut self, input: &str) -> Reply {
        let total = self.questions.len();
        let Some(question) = self.questions.get(self.cursor).cloned() else {
            error!(
                "Session {}: {}",
                self.id,
                StateError::CursorOverflow {
                    cursor: self.cursor,
                    total
                }
            );
            return self.reply(prompts::INTERNAL_STATE_MESSAGE.to_string(), false, vec![]);
        };

        let services = Arc::clone(&self.services);
        let tech_stack = self.profile.tech_stack_display();
        let scored = services
            .evaluator
            .score_answer(
                services.reasoning.as_ref(),
                &question,
                input,
                &tech_stack,
                &self.transcript,
            )
            .await;

        let mut warnings = Vec::new();
        if scored.service_error.is_some() {
            push_unique(&mut warnings, prompts::SERVICE_UNAVAILABLE_NOTICE);
        }
        if let Some(anomaly) = scored.anomaly {
            self.anomalies.push(anomaly);
        }

        debug!(
            "Session {} question {} scored {}/10",
            self.id, question.sequence_index, scored.evaluation.score
        );
        self.evaluations.push(scored.evaluation);
        self.cursor += 1;

        if let Some(next) = self.questions.get(self.cursor) {
            let message = format!(
                "{}\n\n{}",
                scored.acknowledgment,
                prompts::question_prompt(next, total)
            );
            self.transcript.push(Turn::user(input));
            self.transcript.push(Turn::assistant(&message));
            return self.reply(message, true, warnings);
        }

        self.state = InterviewState::Conclusion;
        self.decide(true, &mut warnings).await;

        let average = self.decision.as_ref().map(|d| d.overall_score).unwrap_or(0.0);
        let message = format!(
            "{}\n\nInterview Summary:\n- Questions answered: {}\n- Average score: {:.1}/10",
            scored.acknowledgment,
            self.evaluations.len(),
            average
        );
        self.transcript.push(Turn::user(input));
        self.transcript.push(Turn::assistant(&message));
        self.reply(message, true, warnings)
    }

    /// Computes the decision once; later calls keep the first one.
    async fn decide(&mut self, complete: bool, warnings: &mut Vec<String>) {
        if self.decision.is_some() {
            return;
        }

        let services = Arc::clone(&self.services);
        let synthesized = services
            .evaluator
            .synthesize_decision(
                services.reasoning.as_ref(),
                &self.profile,
                &self.questions,
                &self.evaluations,
                complete,
                &self.transcript,
            )
            .await;

        if synthesized.service_error.is_some() {
            push_unique(warnings, prompts::SERVICE_UNAVAILABLE_NOTICE);
        }
        if let Some(anomaly) = synthesized.anomaly {
            self.anomalies.push(anomaly);
        }
        self.candidate_message = Some(synthesized.candidate_message);
        self.decision = Some(synthesized.decision);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Helpers
    // ────────────────────────────────────────────────────────────────────────

    fn advance(&mut self, input: &str, message: String, warnings: Vec<String>) -> Reply {
        let from = self.state;
        self.state = self.state.next();
        debug!("Session {} {:?} → {:?}", self.id, from, self.state);

        self.transcript.push(Turn::user(input));
        self.transcript.push(Turn::assistant(&message));
        self.reply(message, true, warnings)
    }

    fn reject(&mut self, error: ValidationError) -> Reply {
        self.retry_count += 1;
        info!(
            "Session {} rejected input for {:?} (attempt {}): {}",
            self.id, self.state, self.retry_count, error
        );
        self.reply(error.0, false, vec![])
    }

    fn reprompt_current(&self) -> Reply {
        let message = match self.state {
            InterviewState::Greeting | InterviewState::CollectName => {
                "Could you please tell me your full name?".to_string()
            }
            InterviewState::CollectEmail => prompts::EMAIL_PROMPT.to_string(),
            InterviewState::CollectPhone => prompts::PHONE_PROMPT.to_string(),
            InterviewState::CollectExperience => prompts::EXPERIENCE_PROMPT.to_string(),
            InterviewState::CollectPosition => prompts::POSITION_PROMPT.to_string(),
            InterviewState::CollectLocation => prompts::LOCATION_PROMPT.to_string(),
            InterviewState::CollectTechStack => prompts::TECH_STACK_PROMPT.to_string(),
            InterviewState::AskQuestions => match self.questions.get(self.cursor) {
                Some(q) => prompts::question_prompt(q, self.questions.len()),
                None => prompts::INTERNAL_STATE_MESSAGE.to_string(),
            },
            InterviewState::Conclusion => prompts::EXIT_MESSAGE.to_string(),
            InterviewState::Ended => prompts::SESSION_CLOSED_MESSAGE.to_string(),
        };
        self.reply(message, false, vec![])
    }

    fn closing_message(&self, decision: &ScreeningDecision) -> String {
        let first_name = self.profile.first_name();
        let summary = format!(
            "Screening decision: {} (average {:.1}/10). {}",
            decision.outcome.label(),
            decision.overall_score,
            decision.rationale
        );

        if self.early_exit {
            return format!(
                "Thank you, {first_name}. Your screening session was closed before completion \
                 and the responses you gave have been recorded.\n\n{summary}"
            );
        }

        let candidate_message = self
            .candidate_message
            .clone()
            .unwrap_or_else(|| prompts::default_candidate_message(decision.outcome).to_string());
        format!(
            "{}\n\n{summary}",
            prompts::conclusion_message(first_name, decision.outcome, &candidate_message)
        )
    }

    fn note_failure(&mut self, site: &str, generated: &Generated, warnings: &mut Vec<String>) {
        if let Some(e) = generated.error() {
            self.anomalies.push(Anomaly::new(site, e.to_string()));
            push_unique(warnings, prompts::SERVICE_UNAVAILABLE_NOTICE);
        }
    }

    fn reply(&self, message: String, accepted: bool, warnings: Vec<String>) -> Reply {
        Reply {
            message,
            state: self.state,
            accepted,
            warnings,
        }
    }
}

/// True when the whole input (ignoring case and trailing punctuation) is an exit keyword.
pub fn is_exit_keyword(input: &str) -> bool {
    let normalized = input
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

fn push_unique(warnings: &mut Vec<String>, warning: &str) {
    if !warnings.iter().any(|w| w == warning) {
        warnings.push(warning.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{DifficultyTier, Outcome};
    use crate::interview::reasoning::ReasoningError;
    use crate::interview::testing::{
        services, FailingStore, FakeInterviewer, RecordingStore, ScriptedReasoning,
    };

    const VALID_INPUTS: [&str; 7] = [
        "Ada Lovelace",
        "ada@example.com",
        "+1 (555) 123-4567",
        "3",
        "Backend Engineer",
        "London",
        "Python, Django",
    ];

    fn session_with(
        reasoning: Arc<dyn ReasoningService>,
        store: Arc<dyn SessionStore>,
    ) -> InterviewSession {
        InterviewSession::new(Uuid::new_v4(), services(reasoning, store, 3, 5))
    }

    fn default_session() -> (InterviewSession, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        let session = session_with(Arc::new(FakeInterviewer::scoring(8)), store.clone());
        (session, store)
    }

    /// Starts the session and feeds the first `steps` valid collection inputs.
    async fn drive(session: &mut InterviewSession, steps: usize) {
        session.start().await;
        for input in VALID_INPUTS.iter().take(steps) {
            let reply = session.handle_input(input).await;
            assert!(reply.accepted, "input {input:?} rejected: {}", reply.message);
        }
    }

    #[tokio::test]
    async fn test_session_id_flows_to_snapshot_and_record() {
        let id = Uuid::new_v4();
        let store = Arc::new(RecordingStore::default());
        let mut session = InterviewSession::new(
            id,
            services(Arc::new(FakeInterviewer::scoring(8)), store.clone(), 3, 5),
        );

        assert_eq!(session.snapshot().session_id, id);
        session.handle_input("quit").await;
        session.conclude().await;
        assert_eq!(store.saved()[0].session_id, id);
    }

    #[tokio::test]
    async fn test_start_greets_and_asks_for_name() {
        let (mut session, _) = default_session();
        let reply = session.start().await;

        assert_eq!(reply.state, InterviewState::CollectName);
        assert!(reply.message.contains("name"));
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_greeting_falls_back_when_service_is_down() {
        let mut session = session_with(
            Arc::new(FakeInterviewer::unavailable()),
            Arc::new(RecordingStore::default()),
        );
        let reply = session.start().await;

        assert_eq!(reply.message, prompts::FALLBACK_GREETING);
        assert_eq!(reply.warnings, vec![prompts::SERVICE_UNAVAILABLE_NOTICE]);
        assert_eq!(reply.state, InterviewState::CollectName);
        assert_eq!(session.anomalies().len(), 1);
    }

    #[tokio::test]
    async fn test_input_in_greeting_state_starts_session() {
        let (mut session, _) = default_session();
        let reply = session.handle_input("hello").await;
        assert_eq!(reply.state, InterviewState::CollectName);
    }

    #[tokio::test]
    async fn test_valid_inputs_reach_conclusion_with_full_profile() {
        let (mut session, store) = default_session();
        drive(&mut session, VALID_INPUTS.len()).await;

        assert_eq!(session.state(), InterviewState::AskQuestions);
        assert!(session.profile().is_complete());
        assert_eq!(session.profile().tech_stack, vec!["Python", "Django"]);
        assert_eq!(session.profile().years_experience, Some(3.0));

        let total = session.questions().len();
        assert_eq!(total, 3);
        for i in 0..total {
            let reply = session.handle_input(&format!("Detailed answer number {i}")).await;
            assert!(reply.accepted);
        }

        assert_eq!(session.state(), InterviewState::Conclusion);
        let decision = session.decision().unwrap();
        assert_eq!(decision.outcome, Outcome::ScreenIn);
        assert_eq!(decision.overall_score, 8.0);
        assert!(decision.complete);
        assert_eq!(decision.rationale, "Synthesized rationale.");

        let reply = session.handle_input("thanks").await;
        assert_eq!(reply.state, InterviewState::Ended);
        assert!(reply.message.contains("SCREEN IN"));
        assert!(reply.warnings.is_empty());

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].technical_qa.len(), 3);
        assert!(!saved[0].early_exit);
    }

    #[tokio::test]
    async fn test_invalid_email_keeps_state() {
        let (mut session, _) = default_session();
        drive(&mut session, 1).await;
        assert_eq!(session.state(), InterviewState::CollectEmail);

        let reply = session.handle_input("not-an-email").await;
        assert!(!reply.accepted);
        assert_eq!(reply.state, InterviewState::CollectEmail);
        assert!(reply.message.contains("email"));
        assert_eq!(session.profile().email, None);
        assert_eq!(session.retry_count(), 1);

        session.handle_input("still wrong").await;
        assert_eq!(session.retry_count(), 2);

        let reply = session.handle_input("ada@example.com").await;
        assert!(reply.accepted);
        assert_eq!(session.retry_count(), 0);
        assert_eq!(session.state(), InterviewState::CollectPhone);
    }

    #[tokio::test]
    async fn test_rejected_input_is_not_added_to_transcript() {
        let (mut session, _) = default_session();
        drive(&mut session, 1).await;
        let before = session.transcript().len();

        session.handle_input("   ").await;
        assert_eq!(session.transcript().len(), before);
        assert_eq!(session.state(), InterviewState::CollectEmail);
    }

    #[tokio::test]
    async fn test_quit_from_every_collection_state_screens_out() {
        for steps in 0..VALID_INPUTS.len() {
            let (mut session, _) = default_session();
            drive(&mut session, steps).await;
            let profile_before = session.profile().clone();

            let reply = session.handle_input("QuIt").await;
            assert_eq!(reply.state, InterviewState::Conclusion, "after {steps} steps");
            assert!(session.early_exit());

            let decision = session.decision().unwrap();
            assert_eq!(decision.outcome, Outcome::ScreenOut);
            assert_eq!(decision.rationale, "incomplete interview");
            assert!(!decision.complete);
            assert_eq!(session.profile(), &profile_before);
        }
    }

    #[tokio::test]
    async fn test_quit_from_greeting() {
        let (mut session, _) = default_session();
        let reply = session.handle_input("quit").await;
        assert_eq!(reply.state, InterviewState::Conclusion);
        assert_eq!(session.decision().unwrap().rationale, "incomplete interview");
    }

    #[tokio::test]
    async fn test_exit_mid_questions_keeps_partial_answers() {
        let (mut session, store) = default_session();
        drive(&mut session, VALID_INPUTS.len()).await;
        session.handle_input("Generators yield values lazily.").await;

        let reply = session.handle_input("Bye!").await;
        assert_eq!(reply.state, InterviewState::Conclusion);
        let decision = session.decision().unwrap().clone();
        assert!(!decision.complete);
        assert_eq!(decision.overall_score, 8.0);

        let reply = session.conclude().await;
        assert_eq!(reply.state, InterviewState::Ended);
        assert!(reply.message.contains("closed before completion"));

        let saved = store.saved();
        assert_eq!(saved[0].technical_qa.len(), 1);
        assert!(saved[0].early_exit);
        assert!(!saved[0].decision.complete);
    }

    #[tokio::test]
    async fn test_exit_keyword_must_be_whole_input() {
        assert!(is_exit_keyword("  Goodbye. "));
        assert!(is_exit_keyword("TERMINATE"));
        assert!(!is_exit_keyword("the end of the list"));
        assert!(!is_exit_keyword("backend"));

        let (mut session, _) = default_session();
        drive(&mut session, VALID_INPUTS.len()).await;
        let reply = session.handle_input("I would stop the thread pool first").await;
        assert_eq!(reply.state, InterviewState::AskQuestions);
        assert!(!session.early_exit());
    }

    #[tokio::test]
    async fn test_ended_session_is_idempotent() {
        let (mut session, store) = default_session();
        session.handle_input("exit").await;
        session.handle_input("anything").await;
        assert_eq!(session.state(), InterviewState::Ended);

        let decision = session.decision().cloned();
        let profile = session.profile().clone();
        let answered = session.evaluations().len();

        for input in ["hello", "quit", "", "ada@example.com"] {
            let reply = session.handle_input(input).await;
            assert_eq!(reply.message, prompts::SESSION_CLOSED_MESSAGE);
            assert!(!reply.accepted);
        }

        assert_eq!(session.decision().cloned(), decision);
        assert_eq!(session.profile(), &profile);
        assert_eq!(session.evaluations().len(), answered);
        assert_eq!(store.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_scoring_response_defaults_and_advances() {
        let store = Arc::new(RecordingStore::default());
        // greeting, question tailoring, then two empty replies for the first answer
        let reasoning = Arc::new(ScriptedReasoning::new(vec![
            Ok("Welcome! What's your name?".to_string()),
            Ok("no list here".to_string()),
            Ok(String::new()),
            Ok(String::new()),
        ]));
        let mut session = session_with(reasoning, store);
        drive(&mut session, VALID_INPUTS.len()).await;

        let reply = session.handle_input("A generator is a lazy iterator.").await;
        assert!(reply.accepted);
        assert_eq!(reply.state, InterviewState::AskQuestions);
        assert!(reply.message.contains("Question 2 of 3"));

        let evaluation = &session.evaluations()[0];
        assert_eq!(evaluation.score, 1);
        assert!(!evaluation.feedback.is_empty());
        assert_eq!(session.current_question().unwrap().sequence_index, 1);
    }

    #[tokio::test]
    async fn test_empty_answer_counts_as_answer() {
        let (mut session, _) = default_session();
        drive(&mut session, VALID_INPUTS.len()).await;

        let reply = session.handle_input("   ").await;
        assert!(reply.accepted);
        assert_eq!(session.evaluations().len(), 1);
        assert_eq!(session.evaluations()[0].score, 1);
        assert_eq!(session.evaluations()[0].answer_text, "");
    }

    #[tokio::test]
    async fn test_tailored_questions_replace_seed_text() {
        let store = Arc::new(RecordingStore::default());
        let reasoning = Arc::new(ScriptedReasoning::new(vec![
            Ok("Welcome!".to_string()),
            Ok("1. How would you profile a slow Python service?\n2. How do Django migrations handle conflicts?\n3. Tell me about debugging a production outage.".to_string()),
        ]));
        let mut session = session_with(reasoning, store);
        drive(&mut session, VALID_INPUTS.len()).await;

        let questions = session.questions();
        assert_eq!(questions[0].question_text, "How would you profile a slow Python service?");
        assert_eq!(questions[0].technology, "python");
        assert_eq!(questions[1].difficulty, DifficultyTier::Mid);
        assert!(session.anomalies().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_tailoring_keeps_seeds_and_records_anomaly() {
        let (mut session, _) = default_session();
        drive(&mut session, VALID_INPUTS.len()).await;

        let seeds = QuestionBank::default().generate(
            &["Python".to_string(), "Django".to_string()],
            3.0,
            3,
            5,
        );
        assert_eq!(session.questions(), seeds.as_slice());
        assert_eq!(session.anomalies()[0].site, "question_gen");
    }

    #[tokio::test]
    async fn test_service_outage_degrades_without_losing_data() {
        let store = Arc::new(RecordingStore::default());
        let mut session = session_with(Arc::new(FakeInterviewer::unavailable()), store.clone());
        drive(&mut session, VALID_INPUTS.len()).await;
        assert_eq!(session.questions().len(), 3);

        for _ in 0..3 {
            let reply = session.handle_input("An answer").await;
            assert!(reply.warnings.contains(&prompts::SERVICE_UNAVAILABLE_NOTICE.to_string()));
        }

        assert_eq!(session.state(), InterviewState::Conclusion);
        let decision = session.decision().unwrap();
        assert_eq!(decision.outcome, Outcome::ScreenOut);
        assert_eq!(decision.overall_score, 1.0);
        assert!(decision.rationale.starts_with("Average score 1.0/10"));
        assert!(session.profile().is_complete());
    }

    #[tokio::test]
    async fn test_storage_failure_is_a_warning() {
        let mut session = session_with(Arc::new(FakeInterviewer::scoring(8)), Arc::new(FailingStore));
        session.handle_input("quit").await;

        let reply = session.conclude().await;
        assert_eq!(reply.state, InterviewState::Ended);
        assert_eq!(reply.warnings.len(), 1);
        assert!(reply.warnings[0].contains("could not be saved"));
        assert!(session.record().is_some());
    }

    #[tokio::test]
    async fn test_conclude_outside_conclusion_is_safe() {
        let (mut session, store) = default_session();
        session.start().await;

        let reply = session.conclude().await;
        assert_eq!(reply.message, prompts::INTERNAL_STATE_MESSAGE);
        assert_eq!(session.state(), InterviewState::CollectName);
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_decision_prompt_sees_collected_profile() {
        let reasoning = Arc::new(FakeInterviewer::scoring(9));
        let mut session = session_with(reasoning.clone(), Arc::new(RecordingStore::default()));
        drive(&mut session, VALID_INPUTS.len()).await;
        for _ in 0..3 {
            session.handle_input("Thorough answer").await;
        }

        let sent = reasoning.prompts();
        let decision_prompt = sent.iter().find(|p| p.contains("REASONING:")).unwrap();
        assert!(decision_prompt.contains("Backend Engineer"));
        assert!(decision_prompt.contains("Python, Django"));
    }

    #[tokio::test]
    async fn test_scripted_service_error_in_scoring_sets_notice() {
        let reasoning = Arc::new(ScriptedReasoning::new(vec![
            Ok("Welcome!".to_string()),
            Ok("nope".to_string()),
            Err(ReasoningError::Service("timeout".to_string())),
            Err(ReasoningError::Service("timeout".to_string())),
        ]));
        let mut session = session_with(reasoning, Arc::new(RecordingStore::default()));
        drive(&mut session, VALID_INPUTS.len()).await;

        let reply = session.handle_input("An answer").await;
        assert_eq!(reply.warnings, vec![prompts::SERVICE_UNAVAILABLE_NOTICE]);
        assert_eq!(session.evaluations()[0].score, 1);
    }

    #[test]
    fn test_forward_order() {
        let mut state = InterviewState::Greeting;
        let mut visited = vec![state];
        while state != InterviewState::Ended {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(visited.len(), 11);
        assert_eq!(visited[8], InterviewState::AskQuestions);
    }
}

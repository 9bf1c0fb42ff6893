//! Screening Evaluator: scores answers and aggregates them into a decision.
//!
//! Scoring goes through the reasoning service with a strict line format
//! (`SCORE: <1-10>`). Anything unparseable becomes score 1 plus an `Anomaly`;
//! it never aborts the session.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::interview::models::{
    AnswerEvaluation, Anomaly, CandidateProfile, Outcome, ScreeningDecision, TechnicalQuestion,
};
use crate::interview::prompts::{
    default_candidate_message, labeled_value, PromptRequest, DEFAULT_ACKNOWLEDGMENT,
    EMPTY_ANSWER_FEEDBACK, INCOMPLETE_RATIONALE, UNSCORABLE_FEEDBACK,
};
use crate::interview::reasoning::{generate_with_retry, Generated, ReasoningError, ReasoningService, Turn};

pub const DEFAULT_THRESHOLD: f64 = 6.0;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Parsed `AnswerEval` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub score: u8,
    pub feedback: String,
    pub acknowledgment: String,
}

/// Output of `score_answer`: the evaluation plus what the candidate sees next.
#[derive(Debug, Clone)]
pub struct ScoredAnswer {
    pub evaluation: AnswerEvaluation,
    pub acknowledgment: String,
    pub anomaly: Option<Anomaly>,
    /// Set when the service itself failed (not merely an unparseable reply).
    pub service_error: Option<ReasoningError>,
}

/// Decision plus the optional candidate-facing message from synthesis.
#[derive(Debug, Clone)]
pub struct SynthesizedDecision {
    pub decision: ScreeningDecision,
    pub candidate_message: String,
    pub anomaly: Option<Anomaly>,
    pub service_error: Option<ReasoningError>,
}

#[derive(Debug, Clone)]
pub struct ScreeningEvaluator {
    /// `overall_score >= threshold` screens in.
    pub threshold: f64,
    pub retry_backoff: Duration,
}

impl Default for ScreeningEvaluator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            retry_backoff: Duration::ZERO,
        }
    }
}

impl ScreeningEvaluator {
    pub fn new(threshold: f64, retry_backoff: Duration) -> Self {
        Self {
            threshold,
            retry_backoff,
        }
    }

    /// Scores one answer. Empty answers are scored minimally without a service call.
    pub async fn score_answer(
        &self,
        service: &dyn ReasoningService,
        question: &TechnicalQuestion,
        answer_text: &str,
        tech_stack: &str,
        context: &[Turn],
    ) -> ScoredAnswer {
        if answer_text.trim().is_empty() {
            return ScoredAnswer {
                evaluation: evaluation(question, answer_text, MIN_SCORE, EMPTY_ANSWER_FEEDBACK),
                acknowledgment: DEFAULT_ACKNOWLEDGMENT.to_string(),
                anomaly: None,
                service_error: None,
            };
        }

        let request = PromptRequest::AnswerEval {
            question,
            answer: answer_text,
            tech_stack,
        };
        let generated = generate_with_retry(service, &request, context, self.retry_backoff).await;

        let (parsed, detail, service_error) = match generated {
            Generated::Text(text) => match parse_evaluation(&text) {
                Some(parsed) => (Some(parsed), None, None),
                None => (None, Some(format!("unparseable score in response: {text}")), None),
            },
            Generated::Failed(e) => (None, Some(e.to_string()), Some(e)),
        };

        match parsed {
            Some(parsed) => ScoredAnswer {
                evaluation: evaluation(question, answer_text, parsed.score, &parsed.feedback),
                acknowledgment: parsed.acknowledgment,
                anomaly: None,
                service_error: None,
            },
            None => {
                let detail = detail.unwrap_or_default();
                warn!(
                    "Question {} unscorable, defaulting to {}: {}",
                    question.sequence_index, MIN_SCORE, detail
                );
                ScoredAnswer {
                    evaluation: evaluation(question, answer_text, MIN_SCORE, UNSCORABLE_FEEDBACK),
                    acknowledgment: DEFAULT_ACKNOWLEDGMENT.to_string(),
                    anomaly: Some(Anomaly::new("answer_eval", detail)),
                    service_error,
                }
            }
        }
    }

    /// Aggregates scores into a decision with a deterministic rationale.
    pub fn compute_decision(&self, evaluations: &[AnswerEvaluation], complete: bool) -> ScreeningDecision {
        if evaluations.is_empty() {
            return ScreeningDecision {
                outcome: Outcome::ScreenOut,
                overall_score: 0.0,
                rationale: INCOMPLETE_RATIONALE.to_string(),
                complete: false,
            };
        }

        let overall_score = mean_score(evaluations);
        let outcome = if overall_score >= self.threshold {
            Outcome::ScreenIn
        } else {
            Outcome::ScreenOut
        };

        ScreeningDecision {
            outcome,
            overall_score,
            rationale: template_rationale(overall_score, evaluations.len(), self.threshold, outcome, complete),
            complete,
        }
    }

    /// `compute_decision`, with the rationale rewritten by the reasoning service
    /// when it answers in the expected format.
    pub async fn synthesize_decision(
        &self,
        service: &dyn ReasoningService,
        profile: &CandidateProfile,
        questions: &[TechnicalQuestion],
        evaluations: &[AnswerEvaluation],
        complete: bool,
        context: &[Turn],
    ) -> SynthesizedDecision {
        let mut decision = self.compute_decision(evaluations, complete);
        let default_message = default_candidate_message(decision.outcome).to_string();

        if evaluations.is_empty() {
            return SynthesizedDecision {
                decision,
                candidate_message: default_message,
                anomaly: None,
                service_error: None,
            };
        }

        let request = PromptRequest::DecisionSynth {
            profile,
            questions,
            evaluations,
            overall_score: decision.overall_score,
            outcome: decision.outcome,
        };

        let mut anomaly = None;
        let mut service_error = None;
        let mut candidate_message = default_message;

        match generate_with_retry(service, &request, context, self.retry_backoff).await {
            Generated::Text(text) => match labeled_value(&text, "REASONING").filter(|r| !r.is_empty()) {
                Some(reasoning) => {
                    decision.rationale = reasoning.to_string();
                    if let Some(message) = labeled_value(&text, "MESSAGE").filter(|m| !m.is_empty()) {
                        candidate_message = message.to_string();
                    }
                }
                None => {
                    anomaly = Some(Anomaly::new(
                        "decision_synth",
                        format!("missing REASONING line in response: {text}"),
                    ));
                }
            },
            Generated::Failed(e) => {
                anomaly = Some(Anomaly::new("decision_synth", e.to_string()));
                service_error = Some(e);
            }
        }

        info!(
            "Screening decision: {} ({:.1}/10, complete={})",
            decision.outcome.label(),
            decision.overall_score,
            decision.complete
        );

        SynthesizedDecision {
            decision,
            candidate_message,
            anomaly,
            service_error,
        }
    }
}

fn evaluation(question: &TechnicalQuestion, answer_text: &str, score: u8, feedback: &str) -> AnswerEvaluation {
    AnswerEvaluation {
        question_index: question.sequence_index,
        answer_text: answer_text.to_string(),
        score,
        feedback: feedback.to_string(),
        evaluated_at: Utc::now(),
    }
}

/// Arithmetic mean of the recorded scores; 0 for an empty slice.
pub fn mean_score(evaluations: &[AnswerEvaluation]) -> f64 {
    if evaluations.is_empty() {
        return 0.0;
    }
    let total: u32 = evaluations.iter().map(|e| e.score as u32).sum();
    total as f64 / evaluations.len() as f64
}

fn template_rationale(overall_score: f64, answered: usize, threshold: f64, outcome: Outcome, complete: bool) -> String {
    let comparison = match outcome {
        Outcome::ScreenIn => "meets",
        Outcome::ScreenOut => "is below",
    };
    let mut rationale = format!(
        "Average score {overall_score:.1}/10 across {answered} answered question(s) {comparison} the screening threshold of {threshold:.1}."
    );
    if !complete {
        rationale.push_str(" The interview ended early, so this reflects partial data.");
    }
    rationale
}

/// Parses the `AnswerEval` contract. `None` when no valid `SCORE:` line exists.
pub fn parse_evaluation(text: &str) -> Option<ParsedEvaluation> {
    let score = labeled_value(text, "SCORE").and_then(parse_score)?;

    let feedback = labeled_value(text, "FEEDBACK")
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let parts: Vec<String> = [("STRENGTHS", "Strengths"), ("IMPROVEMENTS", "Improvements")]
                .iter()
                .filter_map(|(label, title)| {
                    labeled_value(text, label)
                        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("n/a"))
                        .map(|v| format!("{title}: {v}"))
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        })
        .unwrap_or_else(|| format!("Scored {score}/10."));

    let acknowledgment = labeled_value(text, "ACKNOWLEDGMENT")
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ACKNOWLEDGMENT)
        .to_string();

    Some(ParsedEvaluation {
        score,
        feedback,
        acknowledgment,
    })
}

/// Reads the leading number of a score token (`8`, `8/10`, `7.5`); `None` outside 1–10.
pub fn parse_score(raw: &str) -> Option<u8> {
    let numeric: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = numeric.trim_end_matches('.').parse().ok()?;
    let rounded = value.round();

    if rounded >= MIN_SCORE as f64 && rounded <= MAX_SCORE as f64 {
        Some(rounded as u8)
    } else {
        None
    }
}

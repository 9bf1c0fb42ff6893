use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Candidate data
// ────────────────────────────────────────────────────────────────────────────

/// Candidate fields collected one state at a time.
/// Frozen once the session enters the technical-question phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<f64>,
    pub desired_position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Vec<String>,
}

impl CandidateProfile {
    /// True when all seven fields are present and non-empty.
    pub fn is_complete(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        filled(&self.name)
            && filled(&self.email)
            && filled(&self.phone)
            && self.years_experience.is_some()
            && filled(&self.desired_position)
            && filled(&self.location)
            && !self.tech_stack.is_empty()
    }

    /// First name for friendly phrasing, "there" when unknown.
    pub fn first_name(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("there")
    }

    pub fn tech_stack_display(&self) -> String {
        if self.tech_stack.is_empty() {
            "N/A".to_string()
        } else {
            self.tech_stack.join(", ")
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Questions and answers
// ────────────────────────────────────────────────────────────────────────────

/// Question difficulty, derived from declared years of experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Junior,
    Mid,
    Senior,
}

impl DifficultyTier {
    /// `< 2` years → junior, `2..=5` → mid, `> 5` → senior.
    pub fn for_experience(years: f64) -> Self {
        if years < 2.0 {
            DifficultyTier::Junior
        } else if years <= 5.0 {
            DifficultyTier::Mid
        } else {
            DifficultyTier::Senior
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Junior => "junior",
            DifficultyTier::Mid => "mid",
            DifficultyTier::Senior => "senior",
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            DifficultyTier::Junior => 0,
            DifficultyTier::Mid => 1,
            DifficultyTier::Senior => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalQuestion {
    pub technology: String,
    pub difficulty: DifficultyTier,
    pub question_text: String,
    pub sequence_index: usize,
}

/// Score and feedback for one answered question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub question_index: usize,
    pub answer_text: String,
    /// 1 – 10
    pub score: u8,
    pub feedback: String,
    pub evaluated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Decision
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    ScreenIn,
    ScreenOut,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::ScreenIn => "SCREEN IN",
            Outcome::ScreenOut => "SCREEN OUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDecision {
    pub outcome: Outcome,
    pub overall_score: f64,
    pub rationale: String,
    /// False when the candidate left before answering every question.
    pub complete: bool,
}

/// A degraded reasoning call or unparseable response, kept for reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub site: String,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl Anomaly {
    pub fn new(site: &str, detail: impl Into<String>) -> Self {
        Self {
            site: site.to_string(),
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persisted record
// ────────────────────────────────────────────────────────────────────────────

/// One question/answer pair as persisted. Field names are read by downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    pub technology: String,
    pub difficulty: DifficultyTier,
    pub question_text: String,
    pub answer_text: String,
    pub score: u8,
    pub feedback: String,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub candidate: CandidateProfile,
    /// Only answered questions; may be shorter than the generated set after an early exit.
    pub technical_qa: Vec<QaEntry>,
    pub decision: ScreeningDecision,
    pub early_exit: bool,
    pub anomalies: Vec<Anomaly>,
    pub status: String,
    pub submission_timestamp: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        session_id: Uuid,
        candidate: CandidateProfile,
        questions: &[TechnicalQuestion],
        evaluations: &[AnswerEvaluation],
        decision: ScreeningDecision,
        early_exit: bool,
        anomalies: Vec<Anomaly>,
    ) -> Self {
        let technical_qa = evaluations
            .iter()
            .filter_map(|evaluation| {
                questions
                    .get(evaluation.question_index)
                    .map(|question| QaEntry {
                        technology: question.technology.clone(),
                        difficulty: question.difficulty,
                        question_text: question.question_text.clone(),
                        answer_text: evaluation.answer_text.clone(),
                        score: evaluation.score,
                        feedback: evaluation.feedback.clone(),
                        answered_at: evaluation.evaluated_at,
                    })
            })
            .collect();

        Self {
            session_id,
            candidate,
            technical_qa,
            decision,
            early_exit,
            anomalies,
            status: "screened".to_string(),
            submission_timestamp: Utc::now(),
        }
    }
}

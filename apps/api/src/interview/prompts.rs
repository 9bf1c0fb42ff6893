// Prompt contracts and candidate-facing text for the interview.
// The state machine builds a `PromptRequest`; rendering to prompt text happens here only.

use crate::interview::models::{
    AnswerEvaluation, CandidateProfile, Outcome, TechnicalQuestion,
};

// ────────────────────────────────────────────────────────────────────────────
// Prompt requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum PromptRequest<'a> {
    Greeting,
    QuestionGen {
        profile: &'a CandidateProfile,
        seeds: &'a [TechnicalQuestion],
    },
    AnswerEval {
        question: &'a TechnicalQuestion,
        answer: &'a str,
        tech_stack: &'a str,
    },
    DecisionSynth {
        profile: &'a CandidateProfile,
        questions: &'a [TechnicalQuestion],
        evaluations: &'a [AnswerEvaluation],
        overall_score: f64,
        outcome: Outcome,
    },
}

impl PromptRequest<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            PromptRequest::Greeting => "greeting",
            PromptRequest::QuestionGen { .. } => "question_gen",
            PromptRequest::AnswerEval { .. } => "answer_eval",
            PromptRequest::DecisionSynth { .. } => "decision_synth",
        }
    }

    pub fn render(&self) -> String {
        match self {
            PromptRequest::Greeting => render_greeting(),
            PromptRequest::QuestionGen { profile, seeds } => render_question_gen(profile, seeds),
            PromptRequest::AnswerEval {
                question,
                answer,
                tech_stack,
            } => render_answer_eval(question, answer, tech_stack),
            PromptRequest::DecisionSynth {
                profile,
                questions,
                evaluations,
                overall_score,
                outcome,
            } => render_decision_synth(profile, questions, evaluations, *overall_score, *outcome),
        }
    }
}

const GREETING_PROMPT: &str = "Greet the candidate warmly and introduce yourself as the \
    Hiring Assistant. Briefly explain that the screening has two parts: gathering some basic \
    information, then a few technical questions based on their skills. Keep it brief, \
    professional, and welcoming. End by asking for their full name.";

/// Replace: {position}, {years}, {tech_stack}, {count}, {seeds}
const QUESTION_GEN_TEMPLATE: &str = r#"The candidate is applying for: {position}
Years of experience: {years}
Declared tech stack: {tech_stack}

Below are {count} seed interview questions, each tagged with its technology and difficulty tier.
Rewrite each one so it is specific, practical, and pitched at the stated tier for this candidate.
Keep the same order and the same technology for each question.

{seeds}

Respond with EXACTLY {count} lines, numbered "1." to "{count}.", containing ONLY the questions."#;

/// Replace: {question}, {technology}, {difficulty}, {tech_stack}, {answer}
const ANSWER_EVAL_TEMPLATE: &str = r#"You are evaluating a technical interview answer.

Question ({technology}, {difficulty} level): {question}

Candidate's Tech Stack: {tech_stack}

Candidate's Answer: {answer}

Evaluate the answer objectively for technical accuracy and relevance.
Respond in this EXACT format, one field per line:
ACKNOWLEDGMENT: <one professional, encouraging sentence addressed to the candidate>
SCORE: <integer from 1 to 10>
FEEDBACK: <one or two sentences on strengths and areas for improvement>"#;

/// Replace: {position}, {years}, {tech_stack}, {qa_summary}, {overall_score}, {outcome}
const DECISION_SYNTH_TEMPLATE: &str = r#"A technical screening has finished and its outcome is already decided.

Candidate:
- Position Applied: {position}
- Years of Experience: {years}
- Tech Stack: {tech_stack}

Technical Assessment:
{qa_summary}

Average score: {overall_score}/10
Outcome: {outcome}

Explain this outcome for the hiring team. Do NOT change the outcome.
Respond in this EXACT format:
REASONING: <1-2 sentence explanation of the outcome>
MESSAGE: <a short professional message to the candidate>"#;

fn render_greeting() -> String {
    GREETING_PROMPT.to_string()
}

fn render_question_gen(profile: &CandidateProfile, seeds: &[TechnicalQuestion]) -> String {
    let seed_lines = seeds
        .iter()
        .enumerate()
        .map(|(i, q)| {
            format!(
                "{}. [{} / {}] {}",
                i + 1,
                q.technology,
                q.difficulty.as_str(),
                q.question_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    QUESTION_GEN_TEMPLATE
        .replace("{position}", profile.desired_position.as_deref().unwrap_or("N/A"))
        .replace("{years}", &format_years(profile.years_experience))
        .replace("{tech_stack}", &profile.tech_stack_display())
        .replace("{count}", &seeds.len().to_string())
        .replace("{seeds}", &seed_lines)
}

fn render_answer_eval(question: &TechnicalQuestion, answer: &str, tech_stack: &str) -> String {
    ANSWER_EVAL_TEMPLATE
        .replace("{question}", &question.question_text)
        .replace("{technology}", &question.technology)
        .replace("{difficulty}", question.difficulty.as_str())
        .replace("{tech_stack}", tech_stack)
        .replace("{answer}", answer)
}

fn render_decision_synth(
    profile: &CandidateProfile,
    questions: &[TechnicalQuestion],
    evaluations: &[AnswerEvaluation],
    overall_score: f64,
    outcome: Outcome,
) -> String {
    let qa_summary = evaluations
        .iter()
        .enumerate()
        .map(|(i, evaluation)| {
            let question = questions
                .get(evaluation.question_index)
                .map(|q| q.question_text.as_str())
                .unwrap_or("(unknown question)");
            format!(
                "Q{}: {}\nAnswer: {}\nScore: {}/10",
                i + 1,
                question,
                truncate(&evaluation.answer_text, 100),
                evaluation.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    DECISION_SYNTH_TEMPLATE
        .replace("{position}", profile.desired_position.as_deref().unwrap_or("N/A"))
        .replace("{years}", &format_years(profile.years_experience))
        .replace("{tech_stack}", &profile.tech_stack_display())
        .replace("{qa_summary}", &qa_summary)
        .replace("{overall_score}", &format!("{overall_score:.1}"))
        .replace("{outcome}", outcome.label())
}

fn format_years(years: Option<f64>) -> String {
    years.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response parsing
// ────────────────────────────────────────────────────────────────────────────

/// Extracts questions from a numbered or bulleted list, dropping fragments of
/// 10 characters or fewer.
pub fn parse_question_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with(|c: char| c.is_ascii_digit()) || line.starts_with(['-', '*'])
        })
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*') || c.is_whitespace()
            })
            .trim()
            .to_string()
        })
        .filter(|q| q.chars().count() > 10)
        .collect()
}

/// Value of the first `LABEL:` line, matched case-insensitively.
pub fn labeled_value<'t>(text: &'t str, label: &str) -> Option<&'t str> {
    text.lines().find_map(|line| {
        let line = line.trim_start_matches(|c: char| matches!(c, '*' | '#' | '-' | '•') || c.is_whitespace());
        let (head, rest) = line.split_once(':')?;
        let head = head.trim().trim_end_matches('*');
        if head.eq_ignore_ascii_case(label) {
            Some(rest.trim().trim_start_matches('*').trim())
        } else {
            None
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate-facing text
// ────────────────────────────────────────────────────────────────────────────

pub const FALLBACK_GREETING: &str = "Hello, and welcome! I'm the Hiring Assistant and I'll be \
    running your initial screening. First I'll gather some basic information, then I'll ask a \
    few technical questions based on your skills. You can type 'exit' at any time to stop.\n\n\
    To begin, could you please tell me your full name?";

pub const EMAIL_PROMPT: &str = "Could you please provide your email address?";
pub const PHONE_PROMPT: &str = "Great! What's the best phone number to reach you?";
pub const EXPERIENCE_PROMPT: &str =
    "Excellent! How many years of professional experience do you have in the tech industry?";
pub const POSITION_PROMPT: &str = "Thank you! What position(s) are you interested in applying for?";
pub const LOCATION_PROMPT: &str = "Perfect! What is your current location (city/region)?";
pub const TECH_STACK_PROMPT: &str = "Now, please tell me about your tech stack. What programming \
    languages, frameworks, databases, and tools are you proficient in?";

pub const EXIT_MESSAGE: &str = "I understand you'd like to end the session. Thank you for your \
    time! If you'd like to complete the screening later, feel free to start a new conversation.";

pub const SESSION_CLOSED_MESSAGE: &str =
    "This screening session has already closed. Please start a new session to begin again.";

pub const INTERNAL_STATE_MESSAGE: &str =
    "Something went wrong on our side with this step. Your information so far is safe.";

pub const SERVICE_UNAVAILABLE_NOTICE: &str = "Service temporarily unavailable, please retry.";

pub const DEFAULT_ACKNOWLEDGMENT: &str = "Thank you for your answer.";

pub const UNSCORABLE_FEEDBACK: &str =
    "This answer could not be evaluated automatically and will be reviewed manually.";

pub const EMPTY_ANSWER_FEEDBACK: &str = "No answer was provided.";

pub const INCOMPLETE_RATIONALE: &str = "incomplete interview";

pub fn email_prompt(first_name: &str) -> String {
    format!("Thank you, {first_name}! {EMAIL_PROMPT}")
}

pub fn technical_intro(tech_stack: &str, count: usize) -> String {
    format!(
        "Great! Thank you for sharing your information.\n\nBased on your tech stack ({tech_stack}) \
         and experience level, I'm going to ask you {count} tailored technical questions. \
         Please answer each one to the best of your ability."
    )
}

pub fn question_prompt(question: &TechnicalQuestion, total: usize) -> String {
    format!(
        "**Question {} of {}** ({}):\n\n{}",
        question.sequence_index + 1,
        total,
        question.technology,
        question.question_text
    )
}

pub fn conclusion_message(first_name: &str, outcome: Outcome, message: &str) -> String {
    match outcome {
        Outcome::ScreenIn => format!(
            "Congratulations, {first_name}!\n\n{message}\n\nOur HR team will review your profile \
             and contact you within 2-3 business days to schedule the next round of interviews."
        ),
        Outcome::ScreenOut => format!(
            "Thank you, {first_name}.\n\n{message}\n\nWe appreciate the time you took to complete \
             this screening. While you haven't met the criteria for this role at this time, we \
             encourage you to keep building your skills and to apply again in the future."
        ),
    }
}

pub fn default_candidate_message(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::ScreenIn => "You showed a solid grasp of the technologies you work with.",
        Outcome::ScreenOut => "Thank you for taking part in the screening.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::DifficultyTier;
    use chrono::Utc;

    fn question(text: &str) -> TechnicalQuestion {
        TechnicalQuestion {
            technology: "python".to_string(),
            difficulty: DifficultyTier::Mid,
            question_text: text.to_string(),
            sequence_index: 0,
        }
    }

    #[test]
    fn test_answer_eval_embeds_question_and_answer() {
        let q = question("What is a generator?");
        let prompt = PromptRequest::AnswerEval {
            question: &q,
            answer: "A lazy iterator.",
            tech_stack: "Python",
        }
        .render();

        assert!(prompt.contains("What is a generator?"));
        assert!(prompt.contains("A lazy iterator."));
        assert!(prompt.contains("SCORE:"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_question_gen_lists_all_seeds() {
        let profile = CandidateProfile {
            desired_position: Some("Backend Engineer".to_string()),
            years_experience: Some(3.0),
            tech_stack: vec!["Python".to_string()],
            ..Default::default()
        };
        let seeds = vec![question("First seed question?"), question("Second seed question?")];
        let prompt = PromptRequest::QuestionGen {
            profile: &profile,
            seeds: &seeds,
        }
        .render();

        assert!(prompt.contains("1. [python / mid] First seed question?"));
        assert!(prompt.contains("2. [python / mid] Second seed question?"));
        assert!(prompt.contains("EXACTLY 2 lines"));
    }

    #[test]
    fn test_decision_synth_truncates_long_answers() {
        let profile = CandidateProfile::default();
        let questions = vec![question("Explain decorators.")];
        let evaluations = vec![AnswerEvaluation {
            question_index: 0,
            answer_text: "x".repeat(300),
            score: 6,
            feedback: String::new(),
            evaluated_at: Utc::now(),
        }];
        let prompt = PromptRequest::DecisionSynth {
            profile: &profile,
            questions: &questions,
            evaluations: &evaluations,
            overall_score: 6.0,
            outcome: Outcome::ScreenIn,
        }
        .render();

        assert!(prompt.contains(&format!("{}...", "x".repeat(100))));
        assert!(!prompt.contains(&"x".repeat(101)));
        assert!(prompt.contains("Outcome: SCREEN IN"));
    }

    #[test]
    fn test_parse_question_lines_strips_numbering() {
        let text = "Here you go:\n1. What is the GIL in CPython?\n2) How do Django signals work?\n- Too short\n* Explain ORM lazy evaluation.";
        assert_eq!(
            parse_question_lines(text),
            vec![
                "What is the GIL in CPython?",
                "How do Django signals work?",
                "Explain ORM lazy evaluation.",
            ]
        );
    }

    #[test]
    fn test_labeled_value_is_case_insensitive() {
        let text = "**Score:** 8/10\nfeedback: Clear and correct.";
        assert_eq!(labeled_value(text, "SCORE"), Some("8/10"));
        assert_eq!(labeled_value(text, "FEEDBACK"), Some("Clear and correct."));
        assert_eq!(labeled_value(text, "MESSAGE"), None);

        let bulleted = "- SCORE: 8\n  • Feedback: Solid.\n- **Acknowledgment:** Thanks!";
        assert_eq!(labeled_value(bulleted, "score"), Some("8"));
        assert_eq!(labeled_value(bulleted, "FEEDBACK"), Some("Solid."));
        assert_eq!(labeled_value(bulleted, "ACKNOWLEDGMENT"), Some("Thanks!"));
    }

    #[test]
    fn test_question_prompt_is_one_based() {
        let q = question("Explain context managers.");
        assert!(question_prompt(&q, 5).starts_with("**Question 1 of 5** (python)"));
    }
}

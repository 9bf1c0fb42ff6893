//! Field validators for the collection states.
//!
//! Each validator returns the normalized value on success or a `ValidationError`
//! whose message tells the candidate what format is expected.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn stack_separator_regex() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"(?i)[,;/|\n]|\s+and\s+")
            .expect("separator pattern is valid")
    })
}

pub fn validate_name(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.chars().count() < 2 {
        return Err(ValidationError::new(
            "Please provide your full name (at least 2 characters).",
        ));
    }
    Ok(value.to_string())
}

pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("Email address is required."));
    }
    if !email_regex().is_match(value) {
        return Err(ValidationError::new(
            "Please provide a valid email address (e.g., name@example.com).",
        ));
    }
    Ok(value.to_string())
}

pub fn validate_phone(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("Phone number is required."));
    }

    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+'))
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::new(
            "Please provide a valid phone number (10-15 digits).",
        ));
    }
    Ok(value.to_string())
}

/// Parses years of experience; accepts fractional values in `0..=50`.
pub fn validate_experience(value: &str) -> Result<f64, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("Years of experience is required."));
    }

    let years: f64 = value.parse().map_err(|_| {
        ValidationError::new("Please provide a valid number for years of experience (e.g., 3).")
    })?;

    if !years.is_finite() || !(0.0..=50.0).contains(&years) {
        return Err(ValidationError::new(
            "Please provide a valid number of years (0-50).",
        ));
    }
    Ok(years)
}

pub fn validate_position(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.chars().count() < 3 {
        return Err(ValidationError::new(
            "Please provide a valid position title (e.g., Software Engineer, Data Scientist).",
        ));
    }
    Ok(value.to_string())
}

pub fn validate_location(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.chars().count() < 2 {
        return Err(ValidationError::new(
            "Please provide a valid location (city, state, or country).",
        ));
    }
    Ok(value.to_string())
}

/// Validates a free-text tech stack and splits it into an ordered list of
/// technologies, dropping case-insensitive duplicates.
pub fn validate_tech_stack(value: &str) -> Result<Vec<String>, ValidationError> {
    let value = value.trim();

    if value.chars().count() < 3 {
        return Err(ValidationError::new(
            "Please provide a valid tech stack with at least one technology (e.g., Python, JavaScript, React).",
        ));
    }
    if !value.chars().any(|c| c.is_alphabetic()) {
        return Err(ValidationError::new(
            "Please provide a valid tech stack (e.g., Python, JavaScript, React, AWS).",
        ));
    }

    let words: Vec<&str> = value.split([',', ' ']).filter(|w| !w.is_empty()).collect();
    if words.len() == 1 && words[0].chars().count() <= 2 {
        return Err(ValidationError::new(
            "Please provide your complete tech stack: the languages, frameworks, and tools you're proficient in.",
        ));
    }

    let mut stack: Vec<String> = Vec::new();
    for item in stack_separator_regex().split(value) {
        let item = item.trim().trim_end_matches('.').trim();
        if item.is_empty() {
            continue;
        }
        if stack.iter().any(|s| s.eq_ignore_ascii_case(item)) {
            continue;
        }
        stack.push(item.to_string());
    }

    if stack.is_empty() {
        return Err(ValidationError::new(
            "Please list the technologies you work with (e.g., Python, Django, PostgreSQL).",
        ));
    }
    Ok(stack)
}

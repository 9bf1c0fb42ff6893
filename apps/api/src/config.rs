use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or out of range.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// When set, records go to Postgres instead of `candidates_dir`.
    pub database_url: Option<String>,
    pub candidates_dir: PathBuf,
    pub screen_in_threshold: f64,
    pub min_questions: usize,
    pub max_questions: usize,
    pub llm_timeout: Duration,
    pub llm_retry_backoff: Duration,
    /// Sessions untouched this long are dropped from memory.
    pub session_idle_ttl: Duration,
    /// How long an ENDED session stays readable before eviction.
    pub session_ended_grace: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY")
                .filter(|v| !v.trim().is_empty())
                .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            candidates_dir: lookup("CANDIDATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/candidates")),
            screen_in_threshold: parse_or(&lookup, "SCREEN_IN_THRESHOLD", 6.0)?,
            min_questions: parse_or(&lookup, "MIN_TECHNICAL_QUESTIONS", 5)?,
            max_questions: parse_or(&lookup, "MAX_TECHNICAL_QUESTIONS", 7)?,
            llm_timeout: Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 30)?),
            llm_retry_backoff: Duration::from_millis(parse_or(&lookup, "LLM_RETRY_BACKOFF_MS", 500)?),
            session_idle_ttl: Duration::from_secs(parse_or(&lookup, "SESSION_IDLE_TTL_SECS", 1800)?),
            session_ended_grace: Duration::from_secs(parse_or(&lookup, "SESSION_ENDED_GRACE_SECS", 60)?),
            session_sweep_interval: Duration::from_secs(parse_or(&lookup, "SESSION_SWEEP_INTERVAL_SECS", 30)?),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1.0..=10.0).contains(&self.screen_in_threshold) {
            bail!(
                "SCREEN_IN_THRESHOLD must be between 1 and 10, got {}",
                self.screen_in_threshold
            );
        }
        if self.min_questions < 1 || self.min_questions > self.max_questions {
            bail!(
                "Question bounds must satisfy 1 <= MIN_TECHNICAL_QUESTIONS <= MAX_TECHNICAL_QUESTIONS, got {}..{}",
                self.min_questions,
                self.max_questions
            );
        }
        if self.session_sweep_interval.is_zero() {
            bail!("SESSION_SWEEP_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

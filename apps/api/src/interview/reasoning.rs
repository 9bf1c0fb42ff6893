//! Reasoning capability: the language-model seam used by the interview.
//!
//! The state machine only sees `ReasoningService::generate`. Every call site goes
//! through `generate_with_retry`, which makes at most one re-attempt and hands the
//! caller a `Generated` value: either usable text or the error that exhausted it,
//! so the caller can substitute its own fallback text.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::interview::prompts::PromptRequest;

/// Attempts per call site: the first call plus one bounded re-attempt.
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReasoningError {
    #[error("reasoning service error: {0}")]
    Service(String),

    #[error("reasoning service returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry, passed back to the service for conversational context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Implemented by the Anthropic-backed `LlmClient` and by test doubles.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, prompt: &str, context: &[Turn]) -> Result<String, ReasoningError>;
}

/// Result of a call site's exchange with the reasoning service.
#[derive(Debug)]
pub enum Generated {
    Text(String),
    Failed(ReasoningError),
}

impl Generated {
    /// The generated text, or `fallback` when the service failed.
    pub fn or_fallback(self, fallback: impl Into<String>) -> String {
        match self {
            Generated::Text(text) => text,
            Generated::Failed(_) => fallback.into(),
        }
    }

    pub fn error(&self) -> Option<&ReasoningError> {
        match self {
            Generated::Text(_) => None,
            Generated::Failed(e) => Some(e),
        }
    }
}

/// Renders `request` and asks the service, re-attempting once after `backoff`.
/// Blank responses count as `EmptyResponse`. Never returns an error upward.
pub async fn generate_with_retry(
    service: &dyn ReasoningService,
    request: &PromptRequest<'_>,
    context: &[Turn],
    backoff: Duration,
) -> Generated {
    let prompt = request.render();
    let mut last_error = ReasoningError::EmptyResponse;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            warn!(
                "{} call attempt {} failed ({}), retrying after {}ms...",
                request.kind(),
                attempt,
                last_error,
                backoff.as_millis()
            );
            tokio::time::sleep(backoff).await;
        }

        match service.generate(&prompt, context).await {
            Ok(text) if !text.trim().is_empty() => return Generated::Text(text.trim().to_string()),
            Ok(_) => last_error = ReasoningError::EmptyResponse,
            Err(e) => last_error = e,
        }
    }

    warn!(
        "{} call failed after {} attempts: {}",
        request.kind(),
        MAX_ATTEMPTS,
        last_error
    );
    Generated::Failed(last_error)
}

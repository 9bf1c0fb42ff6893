//! LLM Client: the Anthropic binding of the interview's `ReasoningService`.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Re-attempts belong to the caller (`generate_with_retry`); this client makes
//! exactly one request per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::interview::reasoning::{ReasoningError, ReasoningService, Role, Turn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all interview calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<LlmError> for ReasoningError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => ReasoningError::EmptyResponse,
            other => ReasoningError::Service(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }

    /// One request to the Messages API with the transcript as context.
    pub async fn call(&self, prompt: &str, context: &[Turn]) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: prompts::SYSTEM_INSTRUCTION,
            messages: build_messages(context, prompt),
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl ReasoningService for LlmClient {
    async fn generate(&self, prompt: &str, context: &[Turn]) -> Result<String, ReasoningError> {
        let response = self.call(prompt, context).await?;
        match response.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::EmptyContent.into()),
        }
    }
}

/// Maps transcript turns to API messages. The API wants alternating roles starting
/// with `user`, so leading assistant turns are dropped and same-role runs merged.
/// The prompt always goes last as a user message.
fn build_messages(context: &[Turn], prompt: &str) -> Vec<AnthropicMessage> {
    let mut messages: Vec<AnthropicMessage> = Vec::with_capacity(context.len() + 1);

    let turns = context
        .iter()
        .skip_while(|turn| turn.role == Role::Assistant)
        .map(|turn| (role_name(turn.role), turn.text.as_str()))
        .chain(std::iter::once(("user", prompt)));

    for (role, text) in turns {
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(text);
            }
            _ => messages.push(AnthropicMessage {
                role,
                content: text.to_string(),
            }),
        }
    }

    messages
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(messages: &[AnthropicMessage]) -> Vec<&'static str> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_build_messages_without_context() {
        let messages = build_messages(&[], "Greet the candidate.");
        assert_eq!(roles(&messages), vec!["user"]);
        assert_eq!(messages[0].content, "Greet the candidate.");
    }

    #[test]
    fn test_build_messages_drops_leading_assistant_turns() {
        let context = vec![
            Turn::assistant("Hello! What's your name?"),
            Turn::user("Ada Lovelace"),
            Turn::assistant("Thanks! Your email?"),
        ];
        let messages = build_messages(&context, "Score this answer.");

        assert_eq!(roles(&messages), vec!["user", "assistant", "user"]);
        assert_eq!(messages[0].content, "Ada Lovelace");
        assert_eq!(messages[2].content, "Score this answer.");
    }

    #[test]
    fn test_build_messages_merges_consecutive_user_turns() {
        let context = vec![Turn::user("Ada Lovelace"), Turn::assistant("Email?"), Turn::user("ada@example.com")];
        let messages = build_messages(&context, "Next prompt");

        assert_eq!(roles(&messages), vec!["user", "assistant", "user"]);
        assert_eq!(messages[2].content, "ada@example.com\n\nNext prompt");
    }

    #[test]
    fn test_empty_content_maps_to_empty_response() {
        assert_eq!(ReasoningError::from(LlmError::EmptyContent), ReasoningError::EmptyResponse);

        let api = LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        };
        assert!(matches!(ReasoningError::from(api), ReasoningError::Service(m) if m.contains("529")));
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let response: LlmResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use"},{"type":"text","text":"Hi"}],"usage":{"input_tokens":3,"output_tokens":1}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("Hi"));
    }
}

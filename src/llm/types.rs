//! Mock chat completion types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request payload for `/api/llm/chat`.
///
/// Either `prompt` or `messages` must be given; a prompt is appended as a
/// final user message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The canned answer fit within the token limit.
    Stop,
    /// The answer was cut at `max_tokens`.
    Length,
}

impl FinishReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-shaped completion returned by the mock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    /// Unix seconds.
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    /// Simulated generation time.
    pub latency_ms: u64,
}

#[derive(Debug, Error, PartialEq)]
pub enum LlmError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' is overloaded, retry later")]
    Overloaded { model: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_prompt_only() {
        let request: ChatRequest = serde_json::from_str(r#"{"prompt": "hello"}"#).unwrap();
        assert_eq!(request.prompt.as_deref(), Some("hello"));
        assert!(request.messages.is_empty());
        assert!(request.model.is_none());
    }

    #[test]
    fn test_finish_reason_wire_format() {
        assert_eq!(serde_json::to_value(FinishReason::Length).unwrap(), "length");
        assert_eq!(FinishReason::Stop.as_str(), "stop");
    }
}

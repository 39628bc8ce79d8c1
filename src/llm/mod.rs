//! Mock LLM used to demonstrate GenAI span attributes.

pub mod engine;
pub mod types;

pub use engine::{estimate_tokens, MockLlm};
pub use types::{ChatCompletion, ChatMessage, ChatRequest, Choice, FinishReason, LlmError, Usage};

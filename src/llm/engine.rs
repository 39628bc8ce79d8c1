//! Mock language model: validation, token estimation, canned answers and
//! simulated latency, each stage in its own span.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::field::Empty;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::llm::types::{
    ChatCompletion, ChatMessage, ChatRequest, Choice, FinishReason, LlmError, Usage,
};
use crate::observability::tracing::mark_span_error;

const MAX_REQUEST_TOKENS: u32 = 4096;

/// A request after defaults and checks have been applied.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Clone)]
pub struct MockLlm {
    config: LlmConfig,
}

impl MockLlm {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    pub fn models(&self) -> &[String] {
        &self.config.models
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Produce a completion for `request`.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let span = tracing::info_span!(
            "llm.chat",
            otel.kind = "client",
            otel.status_code = Empty,
            otel.status_message = Empty,
            gen_ai.system = "mock",
            gen_ai.operation.name = "chat",
            gen_ai.request.model = Empty,
            gen_ai.request.max_tokens = Empty,
            gen_ai.request.temperature = Empty,
            gen_ai.response.id = Empty,
            gen_ai.response.finish_reasons = Empty,
            gen_ai.usage.input_tokens = Empty,
            gen_ai.usage.output_tokens = Empty,
        );

        let result = self.run_chat(request).instrument(span.clone()).await;
        if let Err(e) = &result {
            mark_span_error(&span, &e.to_string());
        }
        result
    }

    async fn run_chat(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let span = tracing::Span::current();
        let request = self.validate(request)?;
        span.record("gen_ai.request.model", request.model.as_str());
        span.record("gen_ai.request.max_tokens", request.max_tokens);
        span.record("gen_ai.request.temperature", request.temperature);

        let failure_rate = self.config.failure_rate.clamp(0.0, 1.0);
        if failure_rate > 0.0 && rand::thread_rng().gen_bool(failure_rate) {
            tracing::warn!(model = %request.model, "Simulated model overload");
            return Err(LlmError::Overloaded {
                model: request.model,
            });
        }

        let prompt_tokens = tracing::info_span!("llm.tokenize", llm.messages = request.messages.len())
            .in_scope(|| {
                request
                    .messages
                    .iter()
                    .map(|m| estimate_tokens(&m.content))
                    .sum::<u32>()
            });
        span.record("gen_ai.usage.input_tokens", prompt_tokens);

        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .or_else(|| request.messages.last())
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let (content, finish_reason) = truncate_to_tokens(&canned_response(last_user), request.max_tokens);
        let completion_tokens = estimate_tokens(&content);
        let latency_ms = self.simulated_latency_ms(completion_tokens);

        tokio::time::sleep(Duration::from_millis(latency_ms))
            .instrument(tracing::info_span!(
                "llm.generate",
                llm.latency_ms = latency_ms,
                llm.completion_tokens = completion_tokens,
            ))
            .await;

        let id = format!("chatcmpl-{}", Uuid::new_v4().simple());
        span.record("gen_ai.response.id", id.as_str());
        span.record("gen_ai.response.finish_reasons", finish_reason.as_str());
        span.record("gen_ai.usage.output_tokens", completion_tokens);

        tracing::info!(
            model = %request.model,
            prompt_tokens,
            completion_tokens,
            latency_ms,
            "Mock completion generated"
        );

        Ok(ChatCompletion {
            id,
            object: "chat.completion".to_string(),
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            model: request.model,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason,
            }],
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms,
        })
    }

    fn validate(&self, request: ChatRequest) -> Result<ValidatedRequest, LlmError> {
        let mut messages = request.messages;
        if let Some(prompt) = request.prompt.filter(|p| !p.trim().is_empty()) {
            messages.push(ChatMessage::user(prompt));
        }
        if messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "either 'prompt' or 'messages' is required".to_string(),
            ));
        }

        let model = request
            .model
            .unwrap_or_else(|| self.config.default_model.clone());
        if !self.config.models.contains(&model) {
            return Err(LlmError::UnknownModel(model));
        }

        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);
        if max_tokens == 0 || max_tokens > MAX_REQUEST_TOKENS {
            return Err(LlmError::InvalidRequest(format!(
                "'max_tokens' must be within 1..={}",
                MAX_REQUEST_TOKENS
            )));
        }

        let temperature = request.temperature.unwrap_or(1.0);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LlmError::InvalidRequest(
                "'temperature' must be within [0, 2]".to_string(),
            ));
        }

        Ok(ValidatedRequest {
            model,
            messages,
            max_tokens,
            temperature,
        })
    }

    fn simulated_latency_ms(&self, completion_tokens: u32) -> u64 {
        let latency = self
            .config
            .base_latency_ms
            .saturating_add(self.config.per_token_latency_ms.saturating_mul(u64::from(completion_tokens)));
        latency.min(self.config.max_latency_ms)
    }
}

/// Rough token count: one token per four characters, at least one.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.div_ceil(4).max(1)
}

fn truncate_to_tokens(text: &str, max_tokens: u32) -> (String, FinishReason) {
    if estimate_tokens(text) <= max_tokens {
        return (text.to_string(), FinishReason::Stop);
    }
    let max_chars = (max_tokens as usize).saturating_mul(4);
    (text.chars().take(max_chars).collect(), FinishReason::Length)
}

fn canned_response(prompt: &str) -> String {
    let lower = prompt.to_lowercase();

    if lower.contains("weather") {
        "I can't look outside, but GET /api/weather can: it geocodes a city, fetches current \
         conditions, and both calls show up as child spans of your request."
            .to_string()
    } else if lower.contains("joke") {
        "Why did the span break up with the log line? It needed more context.".to_string()
    } else if lower.contains("quote") {
        "\"What gets measured gets managed.\" For a fresh one every time, try GET /api/quote."
            .to_string()
    } else if ["trace", "telemetry", "otel", "span"]
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        "Every request to this service starts a server span. Upstream calls become client spans, \
         and their context travels downstream in the traceparent header."
            .to_string()
    } else {
        let snippet: String = prompt.chars().take(80).collect();
        format!(
            "This is a mock completion for: \"{}\". No model weights were consulted.",
            snippet
        )
    }
}

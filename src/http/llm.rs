use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::llm::{ChatCompletion, ChatRequest, LlmError};
use crate::logs::AttrValue;

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: &'static str,
    pub owned_by: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub default_model: String,
    pub data: Vec<ModelInfo>,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Traced<ChatCompletion>, ApiError> {
    let Json(request) = payload?;
    let requested_model = request.model.clone();

    match state.llm.chat(request).await {
        Ok(completion) => {
            state.logger.info(
                "LLM completion generated",
                &[
                    ("gen_ai.request.model", completion.model.as_str().into()),
                    ("gen_ai.usage.input_tokens", completion.usage.prompt_tokens.into()),
                    ("gen_ai.usage.output_tokens", completion.usage.completion_tokens.into()),
                    ("llm.latency_ms", completion.latency_ms.into()),
                ],
            );
            Ok(Traced::new(completion))
        }
        Err(e) => {
            let model = requested_model.unwrap_or_else(|| state.llm.default_model().to_string());
            let attributes: [(&str, AttrValue); 2] = [
                ("gen_ai.request.model", model.as_str().into()),
                ("error.message", e.to_string().into()),
            ];
            match e {
                LlmError::Overloaded { .. } => state.logger.error("LLM request failed", &attributes),
                _ => state.logger.warn("LLM request rejected", &attributes),
            }
            Err(e.into())
        }
    }
}

pub async fn models(State(state): State<AppState>) -> Traced<ModelList> {
    Traced::new(ModelList {
        object: "list",
        default_model: state.llm.default_model().to_string(),
        data: state
            .llm
            .models()
            .iter()
            .map(|id| ModelInfo {
                id: id.clone(),
                object: "model",
                owned_by: "telemetry-demo",
            })
            .collect(),
    })
}

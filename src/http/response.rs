//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Attach the active trace id to every JSON body
//! - Map subsystem errors to HTTP status codes
//! - Render errors as `{ "error", "message", "trace_id" }`
//!
//! # Design Decisions
//! - Server errors mark the request span as failed; client errors do not
//! - Upstream timeouts surface as 504, other upstream failures as 502

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;
use crate::logs::ExportError;
use crate::observability::tracing::{current_trace_id, mark_span_error};
use crate::upstream::UpstreamError;

/// JSON body carrying the active trace id next to its own fields.
#[derive(Debug, Serialize)]
pub struct Traced<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl<T: Serialize> Traced<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            trace_id: current_trace_id(),
        }
    }
}

impl<T: Serialize> IntoResponse for Traced<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("missing or invalid admin credentials")]
    Unauthorized,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("log export failed: {0}")]
    LogExport(#[from] ExportError),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    GatewayTimeout(String),

    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(UpstreamError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Upstream(UpstreamError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Llm(LlmError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Llm(LlmError::UnknownModel(_)) => StatusCode::NOT_FOUND,
            ApiError::Llm(LlmError::Overloaded { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::LogExport(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Upstream(UpstreamError::NotFound(_)) => "not_found",
            ApiError::Upstream(UpstreamError::Timeout { .. }) => "upstream_timeout",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Llm(LlmError::InvalidRequest(_)) => "invalid_request",
            ApiError::Llm(LlmError::UnknownModel(_)) => "model_not_found",
            ApiError::Llm(LlmError::Overloaded { .. }) => "model_overloaded",
            ApiError::LogExport(_) => "log_export_failed",
            ApiError::Internal(_) => "internal_error",
            ApiError::GatewayTimeout(_) => "timeout",
            ApiError::Unavailable(_) => "unavailable",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            mark_span_error(&tracing::Span::current(), &message);
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }

        let body = ErrorBody {
            error: self.code(),
            message,
            trace_id: current_trace_id(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

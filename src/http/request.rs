//! Per-request instrumentation.
//!
//! # Responsibilities
//! - Open one server span per request, parented on incoming `traceparent`
//! - Record the response status on that span
//! - Count requests and latency per matched route
//!
//! # Design Decisions
//! - Request id is assigned before the span opens so the span can carry it
//! - Route labels use the matched path template, never the raw URI

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::http::{HeaderName, Response};
use axum::middleware::Next;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::field::Empty;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::metrics;
use crate::observability::tracing::extract_context;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn route_of<B>(request: &axum::http::Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned())
}

/// Builds the `http.request` server span.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerSpan;

impl<B> MakeSpan<B> for ServerSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let route = route_of(request);
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let span = tracing::info_span!(
            "http.request",
            otel.name = %format!("{} {}", request.method(), route),
            otel.kind = "server",
            otel.status_code = Empty,
            otel.status_message = Empty,
            http.request.method = %request.method(),
            http.route = %route,
            url.path = %request.uri().path(),
            http.response.status_code = Empty,
            request_id = %request_id,
        );

        let _ = span.set_parent(extract_context(request.headers()));
        span
    }
}

/// Records the status code; 5xx responses fail the span.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordStatus;

impl<B> OnResponse<B> for RecordStatus {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("http.response.status_code", status.as_u16());
        if status.is_server_error() {
            span.record("otel.status_code", "ERROR");
        }
        tracing::debug!(
            parent: span,
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request finished"
        );
    }
}

pub async fn track_metrics(request: Request, next: Next) -> axum::response::Response {
    let start = Instant::now();
    let route = route_of(&request);
    let method = request.method().to_string();

    let response = next.run(request).await;

    metrics::record_request(&route, &method, response.status().as_u16(), start);
    response
}

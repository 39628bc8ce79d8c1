//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OTLP span exporter and tracer provider
//! - Extract trace context from incoming requests
//! - Propagate trace context to upstream requests
//! - Expose the active trace/span ids for responses and logs
//!
//! # Design Decisions
//! - Spans are written with `tracing` and bridged by `tracing-opentelemetry`
//! - Supports W3C Trace Context headers
//! - With traces disabled the helpers still work and report no ids

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::global;
use opentelemetry::propagation::{Extractor, Injector};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::{DemoConfig, OtlpProtocol};

/// Build a batching tracer provider exporting to `{endpoint}/v1/traces`.
///
/// The exporter uses a blocking HTTP client on the SDK's own worker thread,
/// so this must run outside the async runtime.
pub fn build_tracer_provider(
    config: &DemoConfig,
) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    let protocol = match config.telemetry.protocol {
        OtlpProtocol::HttpJson => opentelemetry_otlp::Protocol::HttpJson,
        OtlpProtocol::HttpProtobuf => opentelemetry_otlp::Protocol::HttpBinary,
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(config.telemetry.signal_endpoint("/v1/traces"))
        .with_protocol(protocol)
        .with_timeout(Duration::from_secs(config.telemetry.timeout_secs))
        .with_headers(config.telemetry.headers.clone())
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(build_resource(config))
        .build())
}

pub fn build_resource(config: &DemoConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service.name.clone())
        .with_attributes([
            KeyValue::new("service.version", config.service.version.clone()),
            KeyValue::new("deployment.environment", config.service.environment.clone()),
        ])
        .build()
}

/// Install the W3C `traceparent`/`tracestate` propagator globally.
pub fn install_propagator() {
    global::set_text_map_propagator(TraceContextPropagator::new());
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Remote parent context carried by incoming headers (may be empty).
pub fn extract_context(headers: &HeaderMap) -> opentelemetry::Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Write the context of `span` into outgoing request headers.
pub fn inject_context(span: &tracing::Span, headers: &mut HeaderMap) {
    let cx = span.context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderInjector(headers))
    });
}

/// Hex trace id of `span`, if it belongs to a valid trace.
pub fn trace_id_of(span: &tracing::Span) -> Option<String> {
    let cx = span.context();
    let otel_span = cx.span();
    let span_context = otel_span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// Hex span id of `span`, if valid.
pub fn span_id_of(span: &tracing::Span) -> Option<String> {
    let cx = span.context();
    let otel_span = cx.span();
    let span_context = otel_span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.span_id().to_string())
}

pub fn current_trace_id() -> Option<String> {
    trace_id_of(&tracing::Span::current())
}

pub fn current_span_id() -> Option<String> {
    span_id_of(&tracing::Span::current())
}

/// Set error status on a span declared with empty `otel.status_code` and
/// `otel.status_message` fields.
pub fn mark_span_error(span: &tracing::Span, message: &str) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::InMemorySpanExporter;
    use tracing_subscriber::layer::SubscriberExt;

    const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    fn with_otel<F: FnOnce()>(f: F) -> Vec<opentelemetry_sdk::trace::SpanData> {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));

        tracing::subscriber::with_default(subscriber, f);
        let _ = provider.force_flush();
        exporter.get_finished_spans().unwrap()
    }

    #[test]
    fn test_ids_absent_without_tracer() {
        let span = tracing::info_span!("plain");
        assert_eq!(trace_id_of(&span), None);
        assert_eq!(current_span_id(), None);
    }

    #[test]
    fn test_extract_sets_remote_parent() {
        install_propagator();
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", HeaderValue::from_static(TRACEPARENT));

        let mut seen = None;
        let spans = with_otel(|| {
            let span = tracing::info_span!("server");
            let _ = span.set_parent(extract_context(&headers));
            seen = trace_id_of(&span);
        });

        assert_eq!(seen.as_deref(), Some("0af7651916cd43dd8448eb211c80319c"));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].parent_span_id.to_string(), "b7ad6b7169203331");
    }

    #[test]
    fn test_inject_writes_traceparent() {
        install_propagator();
        let mut headers = HeaderMap::new();
        let mut expected = None;

        with_otel(|| {
            let span = tracing::info_span!("client");
            expected = trace_id_of(&span);
            inject_context(&span, &mut headers);
        });

        let traceparent = headers.get("traceparent").unwrap().to_str().unwrap();
        assert!(traceparent.starts_with("00-"));
        assert!(traceparent.contains(expected.as_deref().unwrap()));
    }

    #[test]
    fn test_mark_span_error_sets_status() {
        let spans = with_otel(|| {
            let span = tracing::info_span!(
                "failing",
                otel.status_code = tracing::field::Empty,
                otel.status_message = tracing::field::Empty,
            );
            mark_span_error(&span, "boom");
        });

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, opentelemetry::trace::Status::error("boom"));
    }
}

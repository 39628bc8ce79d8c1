//! Application logger handle used by request handlers.

use std::sync::Arc;

use crate::logs::batcher::LogBatcher;
use crate::logs::record::{AttrValue, LogRecord, Severity};
use crate::observability::tracing::{current_span_id, current_trace_id};

/// Cloneable handle that records a log line to the console and, when log
/// export is enabled, to the batcher with the active trace context.
#[derive(Clone, Default)]
pub struct Logger {
    batcher: Option<Arc<LogBatcher>>,
}

impl Logger {
    pub fn new(batcher: Option<Arc<LogBatcher>>) -> Self {
        Self { batcher }
    }

    /// A logger that only writes to the console.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn log(&self, severity: Severity, body: &str, attributes: &[(&str, AttrValue)]) {
        let trace_id = current_trace_id();
        let span_id = current_span_id();

        let rendered = render_attributes(attributes);
        match severity {
            Severity::Trace => tracing::trace!(target: "app", attributes = %rendered, "{}", body),
            Severity::Debug => tracing::debug!(target: "app", attributes = %rendered, "{}", body),
            Severity::Info => tracing::info!(target: "app", attributes = %rendered, "{}", body),
            Severity::Warn => tracing::warn!(target: "app", attributes = %rendered, "{}", body),
            Severity::Error | Severity::Fatal => {
                tracing::error!(target: "app", severity = %severity, attributes = %rendered, "{}", body)
            }
        }

        if let Some(batcher) = &self.batcher {
            let mut record = LogRecord::new(severity, body).with_trace_context(trace_id, span_id);
            record.attributes = attributes
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect();
            batcher.push(record);
        }
    }

    pub fn debug(&self, body: &str, attributes: &[(&str, AttrValue)]) {
        self.log(Severity::Debug, body, attributes);
    }

    pub fn info(&self, body: &str, attributes: &[(&str, AttrValue)]) {
        self.log(Severity::Info, body, attributes);
    }

    pub fn warn(&self, body: &str, attributes: &[(&str, AttrValue)]) {
        self.log(Severity::Warn, body, attributes);
    }

    pub fn error(&self, body: &str, attributes: &[(&str, AttrValue)]) {
        self.log(Severity::Error, body, attributes);
    }

    pub fn batcher(&self) -> Option<&Arc<LogBatcher>> {
        self.batcher.as_ref()
    }
}

fn render_attributes(attributes: &[(&str, AttrValue)]) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

//! HTTP exporter for OTLP/JSON log payloads.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use thiserror::Error;

use crate::config::TelemetryConfig;
use crate::logs::payload::ExportLogsRequest;

/// Errors from a single export attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build log exporter: {0}")]
    Build(String),

    #[error("log export request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ingest endpoint rejected logs with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends log batches to `{endpoint}/v1/logs`.
#[derive(Clone)]
pub struct OtlpLogExporter {
    client: reqwest::Client,
    url: String,
}

impl OtlpLogExporter {
    pub fn new(config: &TelemetryConfig) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(build_headers(&config.headers)?)
            .build()
            .map_err(|e| ExportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            url: config.signal_endpoint("/v1/logs"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one payload. Any non-2xx response is an error.
    pub async fn export(&self, payload: &ExportLogsRequest) -> Result<(), ExportError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ExportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, ExportError> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ExportError::Build(format!("invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ExportError::Build(format!("invalid value for header '{}': {}", key, e)))?;
        map.insert(name, value);
    }

    Ok(map)
}

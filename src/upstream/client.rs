//! Shared HTTP client for external APIs.
//!
//! # Responsibilities
//! - One pooled `reqwest::Client` with the configured timeout
//! - A client span per call, with W3C trace context injected
//! - Map transport, status, and decode failures to `UpstreamError`

use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::field::Empty;
use tracing::Instrument;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::observability::tracing::{inject_context, mark_span_error};
use crate::upstream::types::{UpstreamError, UpstreamResult};

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Transport {
                service: "client",
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// GET `url` with `query` and decode the JSON body as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let span = tracing::info_span!(
            "upstream.request",
            otel.name = %format!("GET {}", service),
            otel.kind = "client",
            otel.status_code = Empty,
            otel.status_message = Empty,
            upstream.service = service,
            http.request.method = "GET",
            url.full = %url,
            http.response.status_code = Empty,
        );

        let start = Instant::now();
        let result = self.execute(service, url, query).instrument(span.clone()).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                mark_span_error(&span, &e.to_string());
                tracing::warn!(parent: &span, service, error = %e, "Upstream call failed");
                e.kind()
            }
        };
        metrics::record_upstream(service, outcome, start);

        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let span = tracing::Span::current();
        let mut headers = HeaderMap::new();
        inject_context(&span, &mut headers);

        let response = self
            .client
            .get(url)
            .query(query)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify(service, e))?;

        let status = response.status();
        span.record("http.response.status_code", status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout { service }
            } else {
                UpstreamError::Decode {
                    service,
                    message: e.to_string(),
                }
            }
        })
    }
}

fn classify(service: &'static str, error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout { service }
    } else {
        UpstreamError::Transport {
            service,
            message: error.to_string(),
        }
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the demo service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity reported in resource attributes.
    pub service: ServiceConfig,

    /// OTLP ingest endpoint settings.
    pub telemetry: TelemetryConfig,

    /// Application log batching.
    pub logs: LogBatchConfig,

    /// External APIs called by the mock endpoints.
    pub upstream: UpstreamConfig,

    /// Mock language model behaviour.
    pub llm: LlmConfig,

    /// Failure simulation defaults.
    pub failure: FailureConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Value of the `service.name` resource attribute.
    pub name: String,

    /// Value of the `service.version` resource attribute.
    pub version: String,

    /// Value of the `deployment.environment` resource attribute.
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "telemetry-demo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Wire encoding used by the span exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum OtlpProtocol {
    #[serde(rename = "http/json")]
    #[default]
    HttpJson,
    #[serde(rename = "http/protobuf")]
    HttpProtobuf,
}

impl OtlpProtocol {
    /// Parse the value of `OTEL_EXPORTER_OTLP_PROTOCOL`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "http/json" | "json" => Some(Self::HttpJson),
            "http/protobuf" | "http" | "protobuf" => Some(Self::HttpProtobuf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpJson => "http/json",
            Self::HttpProtobuf => "http/protobuf",
        }
    }
}

/// OTLP ingest endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Base URL of the ingest endpoint; `/v1/traces` and `/v1/logs` are appended.
    pub endpoint: String,

    /// Extra headers sent with every export (e.g. authorization).
    pub headers: HashMap<String, String>,

    /// Span export encoding. Logs are always exported as JSON.
    pub protocol: OtlpProtocol,

    /// Export spans.
    pub traces_enabled: bool,

    /// Export application logs.
    pub logs_enabled: bool,

    /// Per-export HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4318".to_string(),
            headers: HashMap::new(),
            protocol: OtlpProtocol::HttpJson,
            traces_enabled: true,
            logs_enabled: true,
            timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    /// Full URL for a signal path such as `/v1/logs`.
    pub fn signal_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/// Log batching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogBatchConfig {
    /// Number of records that triggers an immediate flush and the
    /// maximum number of records per export request.
    pub batch_size: usize,

    /// Interval of the periodic flush in milliseconds.
    pub flush_interval_ms: u64,

    /// Hard cap on buffered records; the oldest are dropped beyond it.
    pub max_buffer_size: usize,

    /// Instrumentation scope name in exported payloads.
    pub scope_name: String,
}

impl Default for LogBatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_ms: 5000,
            max_buffer_size: 1000,
            scope_name: "telemetry-demo".to_string(),
        }
    }
}

/// External API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Open-Meteo geocoding search endpoint.
    pub geocoding_url: String,

    /// Open-Meteo forecast endpoint.
    pub forecast_url: String,

    /// Random quote endpoint.
    pub quotes_url: String,

    /// Random joke endpoint.
    pub jokes_url: String,

    /// Request timeout for every upstream call in seconds.
    pub timeout_secs: u64,

    /// City used by `/api/weather` when no location is given.
    pub default_city: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            quotes_url: "https://dummyjson.com/quotes/random".to_string(),
            jokes_url: "https://official-joke-api.appspot.com/random_joke".to_string(),
            timeout_secs: 10,
            default_city: "London".to_string(),
        }
    }
}

/// Mock LLM configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Models the mock accepts.
    pub models: Vec<String>,

    /// Model used when a request names none.
    pub default_model: String,

    /// Fixed latency added to every completion.
    pub base_latency_ms: u64,

    /// Latency added per generated token.
    pub per_token_latency_ms: u64,

    /// Upper bound of simulated latency.
    pub max_latency_ms: u64,

    /// Probability in [0, 1] that a completion fails as overloaded.
    pub failure_rate: f64,

    /// Default completion token limit.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "mock-gpt-4".to_string(),
                "mock-claude".to_string(),
                "mock-llama".to_string(),
            ],
            default_model: "mock-gpt-4".to_string(),
            base_latency_ms: 150,
            per_token_latency_ms: 8,
            max_latency_ms: 3000,
            failure_rate: 0.0,
            max_tokens: 256,
        }
    }
}

/// Failure simulation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailureConfig {
    /// Failure probability for `type=random` when `rate` is omitted.
    pub default_error_rate: f64,

    /// Delay for `type=timeout` and `type=slow` when `delay_ms` is omitted.
    pub default_delay_ms: u64,

    /// Requested delays are clamped to this value.
    pub max_delay_ms: u64,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            default_error_rate: 0.5,
            default_delay_ms: 3000,
            max_delay_ms: 30_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Console output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the `/admin` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Override with DEMO_ADMIN_API_KEY.
            api_key: "CHANGE_ME".to_string(),
        }
    }
}

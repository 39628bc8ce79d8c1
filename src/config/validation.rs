//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, rates within [0, 1])
//! - Check URLs and socket addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::DemoConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_http_url(&mut errors, "telemetry.endpoint", &config.telemetry.endpoint);
    check_http_url(&mut errors, "upstream.geocoding_url", &config.upstream.geocoding_url);
    check_http_url(&mut errors, "upstream.forecast_url", &config.upstream.forecast_url);
    check_http_url(&mut errors, "upstream.quotes_url", &config.upstream.quotes_url);
    check_http_url(&mut errors, "upstream.jokes_url", &config.upstream.jokes_url);

    if config.telemetry.timeout_secs == 0 {
        errors.push(ValidationError::new("telemetry.timeout_secs", "must be > 0"));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let logs = &config.logs;
    if logs.batch_size == 0 {
        errors.push(ValidationError::new("logs.batch_size", "must be > 0"));
    }
    if logs.max_buffer_size < logs.batch_size {
        errors.push(ValidationError::new(
            "logs.max_buffer_size",
            format!("must be >= logs.batch_size ({})", logs.batch_size),
        ));
    }
    if logs.flush_interval_ms == 0 {
        errors.push(ValidationError::new("logs.flush_interval_ms", "must be > 0"));
    }

    let llm = &config.llm;
    if llm.models.is_empty() {
        errors.push(ValidationError::new("llm.models", "at least one model is required"));
    } else if !llm.models.contains(&llm.default_model) {
        errors.push(ValidationError::new(
            "llm.default_model",
            format!("'{}' is not listed in llm.models", llm.default_model),
        ));
    }
    if llm.base_latency_ms > llm.max_latency_ms {
        errors.push(ValidationError::new(
            "llm.base_latency_ms",
            "must not exceed llm.max_latency_ms",
        ));
    }
    if llm.max_tokens == 0 {
        errors.push(ValidationError::new("llm.max_tokens", "must be > 0"));
    }
    check_rate(&mut errors, "llm.failure_rate", llm.failure_rate);

    let failure = &config.failure;
    check_rate(&mut errors, "failure.default_error_rate", failure.default_error_rate);
    if failure.default_delay_ms > failure.max_delay_ms {
        errors.push(ValidationError::new(
            "failure.default_delay_ms",
            "must not exceed failure.max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must not be empty when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

fn check_rate(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::new(field, "must be within [0, 1]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&DemoConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = DemoConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.telemetry.endpoint = "ftp://collector".into();
        config.logs.batch_size = 50;
        config.logs.max_buffer_size = 10;
        config.llm.failure_rate = 1.5;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "telemetry.endpoint",
                "logs.max_buffer_size",
                "llm.failure_rate",
            ]
        );
    }

    #[test]
    fn test_unknown_default_model() {
        let mut config = DemoConfig::default();
        config.llm.default_model = "gpt-real".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("gpt-real"));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = DemoConfig::default();
        config.logs.batch_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "logs.batch_size"));
    }
}

//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{DemoConfig, OtlpProtocol};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate configuration.
///
/// With no path the built-in defaults are used as the base layer.
pub fn load_config(path: Option<&Path>) -> Result<DemoConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => DemoConfig::default(),
    };

    let mut errors = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Err(invalid) = validate_config(&config) {
        errors.extend(invalid);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Apply the standard OTel variables and a few service-specific ones.
///
/// `lookup` abstracts the environment so tests don't mutate process state.
/// Runs before logging is installed, so unusable values are returned as
/// validation errors instead of being logged.
pub fn apply_env_overrides<F>(config: &mut DemoConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.endpoint = endpoint;
    }

    if let Some(headers) = lookup("OTEL_EXPORTER_OTLP_HEADERS") {
        for (key, value) in parse_header_list(&headers) {
            config.telemetry.headers.insert(key, value);
        }
    }

    if let Some(protocol) = lookup("OTEL_EXPORTER_OTLP_PROTOCOL") {
        match OtlpProtocol::parse(&protocol) {
            Some(protocol) => config.telemetry.protocol = protocol,
            None => errors.push(ValidationError::new(
                "OTEL_EXPORTER_OTLP_PROTOCOL",
                format!("unsupported protocol '{}'", protocol),
            )),
        }
    }

    if let Some(name) = lookup("OTEL_SERVICE_NAME") {
        config.service.name = name;
    }

    if let Some(environment) = lookup("DEPLOYMENT_ENVIRONMENT") {
        config.service.environment = environment;
    }

    if let Some(port) = lookup("PORT") {
        match (port.parse::<u16>(), config.listener.bind_address.parse::<SocketAddr>()) {
            (Ok(port), Ok(mut addr)) => {
                addr.set_port(port);
                config.listener.bind_address = addr.to_string();
            }
            _ => errors.push(ValidationError::new(
                "PORT",
                format!("'{}' is not a valid port", port),
            )),
        }
    }

    if let Some(key) = lookup("DEMO_ADMIN_API_KEY") {
        config.admin.api_key = key;
    }

    errors
}

/// Parse `key1=value1,key2=value2` as used by `OTEL_EXPORTER_OTLP_HEADERS`.
fn parse_header_list(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

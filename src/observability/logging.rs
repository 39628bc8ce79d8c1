//! Structured console logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to `level` for this crate and
/// the HTTP middleware.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level))
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,telemetry_demo={level},app={level},tower_http={level}"
    ))
}

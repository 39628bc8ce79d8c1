//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured console events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (spans bridged to OpenTelemetry, exported over OTLP)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OTLP ingest endpoint (/v1/traces)
//! ```
//!
//! Application logs bound for the ingest endpoint go through `crate::logs`.

pub mod logging;
pub mod metrics;
pub mod tracing;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{DemoConfig, LogFormat};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to create trace exporter: {0}")]
    TraceExporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to initialise tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Owns the tracer provider; flushes pending spans on shutdown.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                ::tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
    }
}

/// Install the global subscriber: env filter, console output and, when
/// traces are enabled, the OpenTelemetry bridge.
pub fn init(config: &DemoConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing::install_propagator();

    let tracer_provider = if config.telemetry.traces_enabled {
        Some(tracing::build_tracer_provider(config)?)
    } else {
        None
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service.name.clone()))
    });

    let registry = tracing_subscriber::registry()
        .with(logging::env_filter(&config.observability.log_level))
        .with(otel_layer);

    match config.observability.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    Ok(TelemetryGuard { tracer_provider })
}

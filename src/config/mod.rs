//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (OTEL_* and friends)
//!     → validation.rs (semantic checks)
//!     → DemoConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AdminConfig, DemoConfig, FailureConfig, ListenerConfig, LlmConfig, LogBatchConfig, LogFormat,
    ObservabilityConfig, OtlpProtocol, ServiceConfig, TelemetryConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};

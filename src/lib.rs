//! Telemetry demo service library.
//!
//! Mock endpoints that produce realistic traces and logs, exported to an
//! OTLP ingest endpoint.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod llm;
pub mod logs;
pub mod observability;
pub mod upstream;

pub use config::schema::DemoConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

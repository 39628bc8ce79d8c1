//! Application log export subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → logger.rs (console echo + trace context capture)
//!     → batcher.rs (bounded buffer, size/interval flush, requeue on failure)
//!     → payload.rs (OTLP/JSON ExportLogsServiceRequest)
//!     → exporter.rs (POST {endpoint}/v1/logs)
//! ```
//!
//! # Design Decisions
//! - One background flusher task; producers never block on export
//! - Buffer is capped; the oldest records are dropped first
//! - A failed batch goes back to the front and waits for the next trigger

pub mod batcher;
pub mod exporter;
pub mod logger;
pub mod payload;
pub mod record;

pub use batcher::{BatchStats, LogBatcher};
pub use exporter::{ExportError, OtlpLogExporter};
pub use logger::Logger;
pub use payload::{build_payload, ExportLogsRequest, ResourceInfo};
pub use record::{AttrValue, LogRecord, Severity};

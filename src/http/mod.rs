//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id, server span from traceparent, metrics)
//!     → handler (health / weather / quote / joke / llm / failure / sdk_test)
//!     → response.rs (trace id in body, error mapping)
//!     → Send to client
//! ```

pub mod failure;
pub mod health;
pub mod joke;
pub mod llm;
pub mod quote;
pub mod request;
pub mod response;
pub mod server;
pub mod weather;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, Traced};
pub use server::{AppState, HttpServer};

//! Failure simulation endpoint.
//!
//! Each mode produces a distinct trace shape: an error status, a slow span,
//! a gateway timeout, a coin-flip failure, or an exception event.

use std::str::FromStr;
use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::field::Empty;
use tracing::Instrument;

use crate::config::FailureConfig;
use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::observability::tracing::mark_span_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    Error,
    Timeout,
    Slow,
    Random,
    Exception,
}

impl FailureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::Error => "error",
            FailureMode::Timeout => "timeout",
            FailureMode::Slow => "slow",
            FailureMode::Random => "random",
            FailureMode::Exception => "exception",
        }
    }
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(FailureMode::Error),
            "timeout" => Ok(FailureMode::Timeout),
            "slow" => Ok(FailureMode::Slow),
            "random" => Ok(FailureMode::Random),
            "exception" => Ok(FailureMode::Exception),
            other => Err(format!(
                "unknown failure type '{}', expected one of: error, timeout, slow, random, exception",
                other
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FailQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub delay_ms: Option<u64>,
    pub rate: Option<f64>,
}

/// A query with defaults applied and bounds checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePlan {
    pub mode: FailureMode,
    pub delay_ms: u64,
    pub rate: f64,
}

impl FailurePlan {
    pub fn from_query(query: &FailQuery, config: &FailureConfig) -> Result<Self, ApiError> {
        let mode = match query.kind.as_deref() {
            None => FailureMode::Error,
            Some(kind) => kind.parse().map_err(ApiError::BadRequest)?,
        };

        let delay_ms = query.delay_ms.unwrap_or(config.default_delay_ms);
        if delay_ms > config.max_delay_ms {
            return Err(ApiError::BadRequest(format!(
                "'delay_ms' must not exceed {}",
                config.max_delay_ms
            )));
        }

        let rate = query.rate.unwrap_or(config.default_error_rate);
        if !(0.0..=1.0).contains(&rate) {
            return Err(ApiError::BadRequest(
                "'rate' must be within [0, 1]".to_string(),
            ));
        }

        Ok(Self {
            mode,
            delay_ms,
            rate,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FailureOutcome {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub mode: FailureMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

/// Error raised by the `exception` mode before it is turned into a response.
#[derive(Debug, Error)]
#[error("simulated unhandled exception in request handler")]
pub struct SimulatedException;

pub async fn simulate_failure(
    State(state): State<AppState>,
    query: Result<Query<FailQuery>, QueryRejection>,
) -> Result<Traced<FailureOutcome>, ApiError> {
    let Query(query) = query?;
    let plan = FailurePlan::from_query(&query, &state.config.failure)?;

    let span = tracing::info_span!(
        "failure.simulate",
        "failure.type" = plan.mode.as_str(),
        failure.delay_ms = Empty,
        failure.rate = Empty,
        failure.triggered = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    );

    let result = run_plan(&state, plan).instrument(span.clone()).await;
    span.record("failure.triggered", result.is_err());
    if let Err(e) = &result {
        mark_span_error(&span, &e.to_string());
    }
    result.map(Traced::new)
}

async fn run_plan(state: &AppState, plan: FailurePlan) -> Result<FailureOutcome, ApiError> {
    let span = tracing::Span::current();
    let logger = &state.logger;

    match plan.mode {
        FailureMode::Error => {
            logger.error(
                "Simulated server error",
                &[("failure.type", plan.mode.as_str().into())],
            );
            Err(ApiError::Internal("simulated server error".to_string()))
        }
        FailureMode::Timeout => {
            span.record("failure.delay_ms", plan.delay_ms);
            logger.warn(
                "Simulating upstream timeout",
                &[("failure.delay_ms", plan.delay_ms.into())],
            );
            tokio::time::sleep(Duration::from_millis(plan.delay_ms)).await;
            Err(ApiError::GatewayTimeout(format!(
                "simulated timeout after {} ms",
                plan.delay_ms
            )))
        }
        FailureMode::Slow => {
            span.record("failure.delay_ms", plan.delay_ms);
            tokio::time::sleep(Duration::from_millis(plan.delay_ms)).await;
            logger.info(
                "Slow request completed",
                &[("failure.delay_ms", plan.delay_ms.into())],
            );
            Ok(FailureOutcome {
                status: "ok",
                mode: plan.mode,
                delay_ms: Some(plan.delay_ms),
                rate: None,
            })
        }
        FailureMode::Random => {
            span.record("failure.rate", plan.rate);
            let failed = plan.rate > 0.0 && rand::thread_rng().gen_bool(plan.rate);
            if failed {
                logger.error(
                    "Random failure triggered",
                    &[("failure.rate", plan.rate.into())],
                );
                return Err(ApiError::Internal(format!(
                    "random failure (rate {})",
                    plan.rate
                )));
            }
            logger.info(
                "Random failure not triggered",
                &[("failure.rate", plan.rate.into())],
            );
            Ok(FailureOutcome {
                status: "ok",
                mode: plan.mode,
                delay_ms: None,
                rate: Some(plan.rate),
            })
        }
        FailureMode::Exception => {
            let error = SimulatedException;
            tracing::error!(
                "exception.type" = "SimulatedException",
                "exception.message" = %error,
                "exception"
            );
            logger.error(
                "Unhandled exception in handler",
                &[
                    ("exception.type", "SimulatedException".into()),
                    ("exception.message", error.to_string().into()),
                ],
            );
            Err(ApiError::Internal(error.to_string()))
        }
    }
}

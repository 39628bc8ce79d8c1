use axum::extract::State;
use serde::Serialize;

use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::logs::BatchStats;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub service: String,
    pub environment: String,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub traces_enabled: bool,
    pub logs_enabled: bool,
    pub telemetry_endpoint: String,
}

#[derive(Serialize)]
pub struct FlushResult {
    pub exported: usize,
    pub buffered: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Traced<SystemStatus> {
    let config = &state.config;
    Traced::new(SystemStatus {
        version: config.service.version.clone(),
        service: config.service.name.clone(),
        environment: config.service.environment.clone(),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        traces_enabled: config.telemetry.traces_enabled,
        logs_enabled: state.batcher.is_some(),
        telemetry_endpoint: config.telemetry.endpoint.clone(),
    })
}

pub async fn get_log_stats(State(state): State<AppState>) -> Result<Traced<BatchStats>, ApiError> {
    let batcher = state
        .batcher
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("log export is disabled".to_string()))?;
    Ok(Traced::new(batcher.stats()))
}

pub async fn flush_logs(State(state): State<AppState>) -> Result<Traced<FlushResult>, ApiError> {
    let batcher = state
        .batcher
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("log export is disabled".to_string()))?;

    let exported = batcher.flush().await?;

    tracing::info!(exported, "Manual log flush completed");
    Ok(Traced::new(FlushResult {
        exported,
        buffered: batcher.stats().buffered,
    }))
}

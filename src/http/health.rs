use axum::extract::State;
use serde::Serialize;

use crate::http::response::Traced;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub endpoints: Vec<Endpoint>,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Liveness and uptime"),
    ("GET", "/api/weather", "Current weather for ?city= or ?lat=&lon="),
    ("GET", "/api/quote", "Random quote"),
    ("GET", "/api/joke", "Random joke"),
    ("POST", "/api/llm/chat", "Mock LLM chat completion"),
    ("GET", "/api/llm/models", "Models served by the mock LLM"),
    ("GET", "/api/fail", "Failure simulation: ?type=error|timeout|slow|random|exception"),
    ("GET", "/api/sdk-test", "Span tree, attributes, events and one log per severity"),
];

pub async fn index(State(state): State<AppState>) -> Traced<ServiceInfo> {
    Traced::new(ServiceInfo {
        service: state.config.service.name.clone(),
        version: state.config.service.version.clone(),
        environment: state.config.service.environment.clone(),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| Endpoint {
                method,
                path,
                description,
            })
            .collect(),
    })
}

pub async fn health(State(state): State<AppState>) -> Traced<HealthResponse> {
    Traced::new(HealthResponse {
        status: "ok",
        service: state.config.service.name.clone(),
        version: state.config.service.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

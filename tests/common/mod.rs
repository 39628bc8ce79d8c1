//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use telemetry_demo::config::DemoConfig;
use telemetry_demo::http::HttpServer;
use telemetry_demo::lifecycle::Shutdown;
use telemetry_demo::logs::{LogBatcher, Logger, OtlpLogExporter, ResourceInfo};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A request as seen by a mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target, String::new()),
    };

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a programmable mock server. Every request is recorded and answered
/// with the `(status, json body)` returned by `f`.
pub async fn start_programmable_backend<F, Fut>(
    addr: SocketAddr,
    f: F,
) -> Arc<Mutex<Vec<RecordedRequest>>>
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let log = recorded.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request.clone());
                        let (status, body) = f(request).await;

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    recorded
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Mock for all three public APIs: geocoding knows London and Paris only.
pub async fn start_mock_upstream(addr: SocketAddr) -> Arc<Mutex<Vec<RecordedRequest>>> {
    start_programmable_backend(addr, |request| async move {
        match request.path.as_str() {
            "/v1/search" => {
                let results = match query_param(&request.query, "name") {
                    Some("London") => json!([{
                        "name": "London", "country": "United Kingdom",
                        "latitude": 51.50853, "longitude": -0.12574, "timezone": "Europe/London"
                    }]),
                    Some("Paris") => json!([{
                        "name": "Paris", "country": "France",
                        "latitude": 48.85341, "longitude": 2.3488, "timezone": "Europe/Paris"
                    }]),
                    _ => json!([]),
                };
                (200, json!({ "results": results }).to_string())
            }
            "/v1/forecast" => (
                200,
                json!({
                    "current": {
                        "time": "2026-10-16T12:00",
                        "temperature_2m": 14.2,
                        "relative_humidity_2m": 71.0,
                        "wind_speed_10m": 12.5,
                        "weather_code": 3
                    }
                })
                .to_string(),
            ),
            "/quotes/random" => (
                200,
                json!({ "id": 7, "quote": "Simplicity is prerequisite for reliability.", "author": "Edsger W. Dijkstra" })
                    .to_string(),
            ),
            "/random_joke" => (
                200,
                json!({ "id": 16, "type": "programming", "setup": "Why do programmers prefer dark mode?", "punchline": "Because light attracts bugs." })
                    .to_string(),
            ),
            _ => (404, json!({ "error": "not found" }).to_string()),
        }
    })
    .await
}

/// Mock OTLP ingest endpoint that records bodies and can be told to fail.
#[derive(Clone)]
pub struct MockIngest {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    accepted: Arc<Mutex<Vec<Value>>>,
    failing: Arc<AtomicBool>,
}

impl MockIngest {
    pub async fn start(addr: SocketAddr) -> Self {
        let failing = Arc::new(AtomicBool::new(false));
        let accepted = Arc::new(Mutex::new(Vec::new()));
        let flag = failing.clone();
        let sink = accepted.clone();

        let requests = start_programmable_backend(addr, move |request| {
            let fail = flag.load(Ordering::SeqCst);
            if !fail && request.path == "/v1/logs" {
                if let Ok(payload) = serde_json::from_str::<Value>(&request.body) {
                    sink.lock().unwrap().push(payload);
                }
            }
            async move {
                if fail {
                    (503, json!({ "error": "ingest unavailable" }).to_string())
                } else {
                    (200, "{}".to_string())
                }
            }
        })
        .await;

        Self {
            requests,
            accepted,
            failing,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `/v1/logs` posts received, accepted or not.
    pub fn log_posts(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == "/v1/logs")
            .count()
    }

    /// Bodies of `/v1/logs` posts answered with 200.
    pub fn accepted_payloads(&self) -> Vec<Value> {
        self.accepted.lock().unwrap().clone()
    }

    /// Log records from accepted payloads, in arrival order.
    pub fn accepted_records(&self) -> Vec<Value> {
        self.accepted_payloads()
            .iter()
            .flat_map(|payload| {
                payload["resourceLogs"][0]["scopeLogs"][0]["logRecords"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Config pointing every outbound URL at local mocks.
pub fn test_config(app: SocketAddr, upstream: SocketAddr, ingest: SocketAddr) -> DemoConfig {
    let mut config = DemoConfig::default();
    config.listener.bind_address = app.to_string();
    config.service.environment = "test".to_string();

    config.telemetry.endpoint = format!("http://{}", ingest);
    config.telemetry.traces_enabled = false;
    config.telemetry.timeout_secs = 2;

    config.logs.flush_interval_ms = 60_000;

    config.upstream.geocoding_url = format!("http://{}/v1/search", upstream);
    config.upstream.forecast_url = format!("http://{}/v1/forecast", upstream);
    config.upstream.quotes_url = format!("http://{}/quotes/random", upstream);
    config.upstream.jokes_url = format!("http://{}/random_joke", upstream);
    config.upstream.timeout_secs = 2;

    config.llm.base_latency_ms = 1;
    config.llm.per_token_latency_ms = 0;
    config.llm.max_latency_ms = 10;

    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// A running service plus the handles tests poke at.
pub struct TestService {
    pub shutdown: Shutdown,
    pub flush_shutdown: Shutdown,
    pub batcher: Option<Arc<LogBatcher>>,
    pub server: tokio::task::JoinHandle<()>,
    pub flusher: Option<tokio::task::JoinHandle<()>>,
}

impl TestService {
    /// Stop the way `main` does: drain the server, then run the final flush.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .expect("server should drain after shutdown")
            .unwrap();

        self.flush_shutdown.trigger();
        if let Some(flusher) = self.flusher {
            tokio::time::timeout(Duration::from_secs(5), flusher)
                .await
                .expect("flusher should stop after shutdown")
                .unwrap();
        }
    }
}

/// Start the service the way `main` does, minus signal handling and
/// global telemetry.
pub async fn start_service(config: DemoConfig) -> TestService {
    let shutdown = Shutdown::new();
    let flush_shutdown = Shutdown::new();
    let addr = config.listener.bind_address.clone();

    let batcher = if config.telemetry.logs_enabled {
        let exporter = OtlpLogExporter::new(&config.telemetry).unwrap();
        Some(Arc::new(LogBatcher::new(
            config.logs.clone(),
            ResourceInfo::from(&config.service),
            exporter,
        )))
    } else {
        None
    };
    let flusher = batcher
        .clone()
        .map(|b| tokio::spawn(b.run(flush_shutdown.subscribe())));

    let server = HttpServer::new(config, Logger::new(batcher.clone()), batcher.clone()).unwrap();
    let listener = TcpListener::bind(&addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    TestService {
        shutdown,
        flush_shutdown,
        batcher,
        server,
        flusher,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    check()
}

//! Route behaviour against local mock upstreams.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};

mod common;

fn addrs(base: u16) -> (SocketAddr, SocketAddr, SocketAddr) {
    let addr = |port: u16| format!("127.0.0.1:{}", port).parse().unwrap();
    (addr(base), addr(base + 1), addr(base + 2))
}

#[tokio::test]
async fn test_health_and_index() {
    let (app, upstream, ingest) = addrs(38101);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();

    let res = client.get(format!("http://{}/health", app)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "telemetry-demo");
    assert!(body["uptime_secs"].is_u64());

    let body: Value = client
        .get(format!("http://{}/", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["environment"], "test");
    let paths: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/sdk-test"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, upstream, ingest) = addrs(38111);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/health", app))
        .header("x-request-id", "req-from-client")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-from-client");
}

#[tokio::test]
async fn test_weather_lookup() {
    let (app, upstream, ingest) = addrs(38121);
    let calls = common::start_mock_upstream(upstream).await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/api/weather?city=Paris", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["location"]["name"], "Paris");
    assert_eq!(body["current"]["temperature_c"], 14.2);
    assert_eq!(body["current"]["description"], "Overcast");

    // Default city when none is given.
    let body: Value = client
        .get(format!("http://{}/api/weather", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["location"]["name"], "London");

    let searches = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.path == "/v1/search")
        .count();
    assert_eq!(searches, 2);
}

#[tokio::test]
async fn test_weather_coordinates_skip_geocoding() {
    let (app, upstream, ingest) = addrs(38131);
    let calls = common::start_mock_upstream(upstream).await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/api/weather?lat=40.7&lon=-74.0", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["location"]["latitude"], 40.7);
    assert!(calls.lock().unwrap().iter().all(|r| r.path != "/v1/search"));

    let res = client
        .get(format!("http://{}/api/weather?lat=40.7", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .get(format!("http://{}/api/weather?lat=95&lon=0", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .get(format!("http://{}/api/weather?lat=north&lon=0", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_weather_unknown_city() {
    let (app, upstream, ingest) = addrs(38141);
    common::start_mock_upstream(upstream).await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/api/weather?city=Atlantis", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn test_quote_and_joke() {
    let (app, upstream, ingest) = addrs(38151);
    common::start_mock_upstream(upstream).await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();

    let quote: Value = client
        .get(format!("http://{}/api/quote", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["author"], "Edsger W. Dijkstra");
    assert_eq!(quote["text"], "Simplicity is prerequisite for reliability.");

    let joke: Value = client
        .get(format!("http://{}/api/joke", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(joke["category"], "programming");
    assert_eq!(joke["punchline"], "Because light attracts bugs.");
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let (app, upstream, ingest) = addrs(38161);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    // Nothing listens on the upstream port.
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/api/joke", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_upstream_server_error_is_bad_gateway() {
    let (app, upstream, ingest) = addrs(38221);
    common::start_programmable_backend(upstream, |_| async {
        (500, json!({ "error": "boom" }).to_string())
    })
    .await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/api/quote", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_slow_upstream_is_gateway_timeout() {
    let (app, upstream, ingest) = addrs(38231);
    common::start_programmable_backend(upstream, |_| async {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        (200, json!({ "id": 1, "quote": "late", "author": "nobody" }).to_string())
    })
    .await;
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    config.upstream.timeout_secs = 1;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/api/quote", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream_timeout");
}

#[tokio::test]
async fn test_llm_chat() {
    let (app, upstream, ingest) = addrs(38171);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();
    let url = format!("http://{}/api/llm/chat", app);

    let res = client
        .post(&url)
        .json(&json!({ "prompt": "Tell me a joke", "model": "mock-claude" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["model"], "mock-claude");
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    let usage = &body["usage"];
    assert_eq!(
        usage["total_tokens"].as_u64().unwrap(),
        usage["prompt_tokens"].as_u64().unwrap() + usage["completion_tokens"].as_u64().unwrap()
    );

    let res = client.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let res = client
        .post(&url)
        .json(&json!({ "prompt": "hi", "model": "gpt-real" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let models: Value = client
        .get(format!("http://{}/api/llm/models", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(models["data"].as_array().unwrap().len(), 3);
    assert_eq!(models["default_model"], "mock-gpt-4");
}

#[tokio::test]
async fn test_failure_modes() {
    let (app, upstream, ingest) = addrs(38181);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;
    let client = common::client();

    let status_of = |query: &'static str| {
        let client = client.clone();
        async move {
            client
                .get(format!("http://{}/api/fail?{}", app, query))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }
    };

    assert_eq!(status_of("type=error").await, 500);
    assert_eq!(status_of("type=exception").await, 500);
    assert_eq!(status_of("type=timeout&delay_ms=20").await, 504);
    assert_eq!(status_of("type=slow&delay_ms=20").await, 200);
    assert_eq!(status_of("type=random&rate=0").await, 200);
    assert_eq!(status_of("type=random&rate=1").await, 500);
    assert_eq!(status_of("type=meltdown").await, 400);
    assert_eq!(status_of("type=slow&delay_ms=999999").await, 400);
    assert_eq!(status_of("type=random&rate=2").await, 400);

    let body: Value = client
        .get(format!("http://{}/api/fail?type=error", app))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn test_sdk_test_report() {
    let (app, upstream, ingest) = addrs(38191);
    let mut config = common::test_config(app, upstream, ingest);
    config.telemetry.logs_enabled = false;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/api/sdk-test", app))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["spans_created"], 5);
    assert_eq!(body["error_spans"], 1);
    assert_eq!(body["logs_emitted"], 6);
    assert_eq!(body["logs_exported"], false);

    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    let failed: Vec<&str> = steps
        .iter()
        .filter(|s| s["status"] == "error")
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(failed, vec!["persist"]);
}

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let (app, upstream, ingest) = addrs(38201);
    let config = common::test_config(app, upstream, ingest);
    let _service = common::start_service(config).await;
    let client = common::client();
    let url = format!("http://{}/admin/status", app);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth("wrong").send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(&url)
        .bearer_auth(common::ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["logs_enabled"], true);
}

#[tokio::test]
async fn test_admin_disabled() {
    let (app, upstream, ingest) = addrs(38211);
    let mut config = common::test_config(app, upstream, ingest);
    config.admin.enabled = false;
    let _service = common::start_service(config).await;

    let res = common::client()
        .get(format!("http://{}/admin/status", app))
        .bearer_auth(common::ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `demo_http_requests_total` (counter): requests by route, method, status
//! - `demo_http_request_duration_seconds` (histogram): handler latency by route
//! - `demo_upstream_requests_total` (counter): outbound calls by service, outcome
//! - `demo_upstream_duration_seconds` (histogram): outbound latency by service
//! - `demo_logs_exported_total` / `demo_logs_dropped_total` (counters)
//! - `demo_log_exports_failed_total` (counter)
//! - `demo_log_buffer_size` (gauge): records waiting for export
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "demo_http_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!("demo_http_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(service: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!("demo_upstream_requests_total", "service" => service, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("demo_upstream_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_logs_exported(count: usize) {
    metrics::counter!("demo_logs_exported_total").increment(count as u64);
}

pub fn record_logs_dropped(count: usize) {
    metrics::counter!("demo_logs_dropped_total").increment(count as u64);
}

pub fn record_log_export_failure() {
    metrics::counter!("demo_log_exports_failed_total").increment(1);
}

pub fn record_log_buffer_size(size: usize) {
    metrics::gauge!("demo_log_buffer_size").set(size as f64);
}

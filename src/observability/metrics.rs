//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, path, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rate_limited_total` (counter): rejections by limiter
//! - `gateway_upstream_requests_total` (counter): provider calls by outcome
//! - `gateway_upstream_duration_seconds` (histogram): provider latency
//!
//! Recording is a no-op until a recorder is installed, so tests never need
//! an exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(limiter: &str) {
    counter!("gateway_rate_limited_total", "limiter" => limiter.to_string()).increment(1);
}

pub fn record_upstream(provider: &str, outcome: &str, start: Instant) {
    counter!(
        "gateway_upstream_requests_total",
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("gateway_upstream_duration_seconds", "provider" => provider.to_string())
        .record(start.elapsed().as_secs_f64());
}

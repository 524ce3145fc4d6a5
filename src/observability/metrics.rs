//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by route, status
//! - `proxy_request_duration_seconds` (histogram): inbound latency by route
//! - `proxy_upstream_requests_total` (counter): provider calls by operation, outcome
//! - `proxy_upstream_retries_total` (counter): backoff retries by operation
//! - `proxy_fanout_branch_failures_total` (counter): failed stats branches by event

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_request(operation: &str, outcome: &'static str) {
    ::metrics::counter!(
        "proxy_upstream_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_retry(operation: &str) {
    ::metrics::counter!("proxy_upstream_retries_total", "operation" => operation.to_string())
        .increment(1);
}

pub fn record_fanout_failure(event: &str) {
    ::metrics::counter!("proxy_fanout_branch_failures_total", "event" => event.to_string())
        .increment(1);
}

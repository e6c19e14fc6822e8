//! Metrics collection and exposition.
//!
//! # Metrics
//! - `waypoint_requests_total` (counter): responses written, by method and status
//! - `waypoint_request_duration_seconds` (histogram): time from accept to write
//! - `waypoint_aborted_total` (counter): requests whose connection aborted
//! - `waypoint_errors_total` (counter): failures by classification
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in through configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one written response.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "waypoint_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("waypoint_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_aborted() {
    metrics::counter!("waypoint_aborted_total").increment(1);
}

/// Record a failure by its classification (`invalid_method`, `router_failure`, ...).
pub fn record_error(kind: &'static str) {
    metrics::counter!("waypoint_errors_total", "kind" => kind).increment(1);
}

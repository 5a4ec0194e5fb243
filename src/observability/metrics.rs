//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): relayed requests by method, status
//! - `proxy_request_duration_seconds` (histogram): time to upstream response headers
//! - `proxy_upstream_failures_total` (counter): transport failures by phase
//! - `proxy_guard_rejections_total` (counter): requests refused before upstream I/O
//! - `proxy_bridge_sessions_active` (gauge): bridge sessions not yet closed
//! - `proxy_bridge_sessions_total` (counter): finished sessions by terminal event
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// `phase` is `relay` or `bridge_connect`.
pub fn record_upstream_failure(phase: &'static str) {
    counter!("proxy_upstream_failures_total", "phase" => phase).increment(1);
}

pub fn record_guard_rejection(reason: &'static str) {
    counter!("proxy_guard_rejections_total", "reason" => reason).increment(1);
}

pub fn bridge_session_opened() {
    gauge!("proxy_bridge_sessions_active").increment(1.0);
}

pub fn bridge_session_closed(terminated_by: &'static str) {
    gauge!("proxy_bridge_sessions_active").decrement(1.0);
    counter!("proxy_bridge_sessions_total", "terminated_by" => terminated_by).increment(1);
}

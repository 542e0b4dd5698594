//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_requests_total` (counter): requests by method, status
//! - `app_request_duration_seconds` (histogram): latency distribution
//! - `app_rejections_total` (counter): admission rejections by kind
//! - `app_chain_faults_total` (counter): chains that errored or panicked
//! - `app_context_pool_idle` (gauge): contexts waiting for reuse

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];

    ::metrics::counter!("app_requests_total", &labels).increment(1);
    ::metrics::histogram!("app_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(kind: &'static str) {
    ::metrics::counter!("app_rejections_total", "kind" => kind).increment(1);
}

pub fn record_fault() {
    ::metrics::counter!("app_chain_faults_total").increment(1);
}

pub fn record_pool_idle(idle: usize) {
    ::metrics::gauge!("app_context_pool_idle").set(idle as f64);
}

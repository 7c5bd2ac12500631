//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, sidecar
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_payload_rejected_total` (counter): 413 answers
//! - `edge_sidecar_activations_total` (counter): cold starts per sidecar
//! - `edge_sidecar_state` (gauge): lifecycle state per sidecar (0=stopped .. 4=errored)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, sidecar: &str, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "sidecar" => sidecar.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "edge_request_duration_seconds",
        "method" => method.to_string(),
        "sidecar" => sidecar.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_payload_rejected() {
    metrics::counter!("edge_payload_rejected_total").increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `viaduct_requests_total` (counter): requests by method, status, origin
//! - `viaduct_request_duration_seconds` (histogram): end-to-end latency
//! - `viaduct_retries_total` (counter): extra attempts beyond the first
//! - `viaduct_attempt_failures_total` (counter): per-origin failures by kind
//! - `viaduct_origin_health` (gauge): 1=healthy, 0=unhealthy per origin
//! - `viaduct_pool_exhausted_total` (counter): acquire timeouts per origin
//!
//! # Design Decisions
//! - Updates are atomic increments; recording never blocks
//! - The Prometheus exporter runs its own scrape listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::origins::origin::HealthState;

/// Start the Prometheus scrape endpoint and register metric metadata.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        tracing::error!(error = %e, "failed to install metrics exporter");
        return;
    }

    metrics::describe_counter!(
        "viaduct_requests_total",
        "Total requests dispatched, by method, status, and origin"
    );
    metrics::describe_histogram!(
        "viaduct_request_duration_seconds",
        "End-to-end request latency in seconds"
    );
    metrics::describe_counter!(
        "viaduct_retries_total",
        "Attempts beyond the first, across all requests"
    );
    metrics::describe_counter!(
        "viaduct_attempt_failures_total",
        "Failed attempts against origins, by failure kind"
    );
    metrics::describe_gauge!(
        "viaduct_origin_health",
        "Origin health: 1 healthy, 0 unhealthy, 0.5 unknown"
    );
    metrics::describe_counter!(
        "viaduct_pool_exhausted_total",
        "Connection acquisitions that timed out, per origin"
    );

    tracing::info!(address = %addr, "metrics exporter listening");
}

pub fn record_request(method: &str, status: u16, origin: Option<&str>, elapsed: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("origin", origin.unwrap_or("none").to_string()),
    ];
    metrics::counter!("viaduct_requests_total", &labels).increment(1);
    metrics::histogram!("viaduct_request_duration_seconds", &labels)
        .record(elapsed.as_secs_f64());
}

pub fn record_retries(count: u32) {
    metrics::counter!("viaduct_retries_total").increment(count as u64);
}

pub fn record_attempt_failure(origin: &str, kind: &'static str) {
    let labels = [("origin", origin.to_string()), ("kind", kind.to_string())];
    metrics::counter!("viaduct_attempt_failures_total", &labels).increment(1);
}

pub fn record_origin_health(origin: &str, state: HealthState) {
    let value = match state {
        HealthState::Healthy => 1.0,
        HealthState::Unhealthy => 0.0,
        HealthState::Unknown => 0.5,
    };
    let labels = [("origin", origin.to_string())];
    metrics::gauge!("viaduct_origin_health", &labels).set(value);
}

pub fn record_pool_exhausted(origin: &str) {
    let labels = [("origin", origin.to_string())];
    metrics::counter!("viaduct_pool_exhausted_total", &labels).increment(1);
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Core components emit ProxyEvent on a non-blocking channel
//!     → consume_events (this module)
//!         → logging.rs (structured log lines via tracing)
//!         → metrics.rs (counters, gauges, histograms)
//!             → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - The event consumer runs outside the request path; a slow scrape or
//!   log sink never stalls a request
//! - Metric updates are atomic increments through the metrics crate

pub mod logging;
pub mod metrics;

use tokio::sync::mpsc;

use crate::events::ProxyEvent;

/// Drain the core's event channel into logs and metrics. Runs until the
/// sender side is dropped (engine teardown).
pub async fn consume_events(mut rx: mpsc::UnboundedReceiver<ProxyEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProxyEvent::RequestDispatched {
                method,
                path,
                status,
                origin,
                attempts,
                elapsed,
            } => {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status,
                    origin = origin.as_deref().unwrap_or("-"),
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "request dispatched"
                );
                metrics::record_request(&method, status, origin.as_deref(), elapsed);
                if attempts > 1 {
                    metrics::record_retries(attempts - 1);
                }
            }
            ProxyEvent::AttemptFailed { origin, kind } => {
                metrics::record_attempt_failure(&origin, kind.as_str());
            }
            ProxyEvent::OriginHealthChanged { origin, from, to } => {
                tracing::info!(
                    origin = %origin,
                    from = from.as_str(),
                    to = to.as_str(),
                    "origin health changed"
                );
                metrics::record_origin_health(&origin, to);
            }
            ProxyEvent::PoolExhausted { origin } => {
                tracing::warn!(origin = %origin, "connection pool exhausted");
                metrics::record_pool_exhausted(&origin);
            }
        }
    }
}

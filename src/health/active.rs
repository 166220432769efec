//! Active recovery probing.
//!
//! # Responsibilities
//! - Periodically probe UNHEALTHY origins
//! - Mark recovered origins HEALTHY through the inventory

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::HOST, Request};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::schema::HealthCheckConfig;
use crate::origins::inventory::OriginInventory;
use crate::origins::origin::{HealthState, Origin};
use crate::pool::connection::Connector;

pub struct HealthMonitor {
    inventory: Arc<OriginInventory>,
    connector: Arc<dyn Connector>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(
        inventory: Arc<OriginInventory>,
        connector: Arc<dyn Connector>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            inventory,
            connector,
            config,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_unhealthy().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("health monitor stopping");
                    break;
                }
            }
        }
    }

    async fn probe_unhealthy(&self) {
        for origin in self.inventory.all_origins() {
            if origin.health() != HealthState::Unhealthy {
                continue;
            }
            if self.probe(&origin).await {
                self.inventory.record_success(&origin);
            } else {
                tracing::debug!(origin = %origin.name, "recovery probe failed");
            }
        }
    }

    /// One out-of-band probe: fresh connection, GET on the health path.
    async fn probe(&self, origin: &Arc<Origin>) -> bool {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        let attempt = async {
            let mut conn = self.connector.connect(origin.clone()).await?;
            let request = Request::builder()
                .method("GET")
                .uri(self.config.path.as_str())
                .header(HOST, origin.addr.to_string())
                .header("user-agent", "viaduct-health-check")
                .body(Body::empty())
                .map_err(|e| crate::errors::ProxyError::OriginProtocolError {
                    origin: origin.name.clone(),
                    source: Box::new(e),
                })?;
            conn.send(request).await
        };

        match time::timeout(deadline, attempt).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(e)) => {
                tracing::debug!(origin = %origin.name, error = %e, "probe connection failed");
                false
            }
            Err(_) => {
                tracing::debug!(origin = %origin.name, "probe timed out");
                false
            }
        }
    }
}

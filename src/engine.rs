//! Engine: wires components and owns the start/stop contract.
//!
//! # Responsibilities
//! - Assemble router, inventory, pool, dispatcher, and pipeline from a
//!   validated configuration (once, at construction)
//! - start: spawn the server, health monitor, and pool sweeper
//! - stop: drain in-flight requests, then release pooled connections
//!
//! # Design Decisions
//! - Construction is the only place configuration is read; the running
//!   engine holds immutable snapshots
//! - stop() is idempotent (atomic flag) and safe before start

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::dispatcher::Dispatcher;
use crate::events::{EventSink, ProxyEvent};
use crate::health::active::HealthMonitor;
use crate::http::server::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::origins::inventory::OriginInventory;
use crate::pipeline::chain::Pipeline;
use crate::pool::connection::{Connector, HttpConnector};
use crate::pool::pool::ConnectionPool;
use crate::routing::router::{Destination, Router, RouterHandle};

/// The assembled proxy core.
pub struct Engine {
    pipeline: Arc<Pipeline>,
    pool: Arc<ConnectionPool>,
    inventory: Arc<OriginInventory>,
    connector: Arc<dyn Connector>,
    config: ProxyConfig,
    shutdown: Shutdown,
    started: AtomicBool,
    stopped: AtomicBool,
    server_task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Wire an engine from configuration. Returns the engine and the
    /// receiving end of its event channel.
    pub fn new(
        config: ProxyConfig,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<ProxyEvent>), Vec<ValidationError>> {
        validate_config(&config)?;

        let (events, events_rx) = EventSink::channel();

        let inventory = Arc::new(
            OriginInventory::from_config(
                &config.origins,
                config.health_check.unhealthy_threshold,
                events.clone(),
            )
            .map_err(|e| vec![e])?,
        );

        let connector: Arc<dyn Connector> = Arc::new(HttpConnector::new(Duration::from_millis(
            config.timeouts.connect_ms,
        )));

        let pool = Arc::new(ConnectionPool::new(
            connector.clone(),
            config.pool.clone(),
            events.clone(),
        ));

        let default = config
            .default_group
            .as_ref()
            .map(|group| Destination::Group(group.clone()));
        let router = RouterHandle::new(
            Router::from_config(&config.routes, default).map_err(|e| vec![e])?,
        );

        let dispatcher = Arc::new(Dispatcher::new(
            router,
            inventory.clone(),
            pool.clone(),
            config.retries.clone(),
            config.timeouts.clone(),
            events.clone(),
        ));

        let pipeline = Arc::new(
            Pipeline::from_config(&config.interceptors, dispatcher).map_err(|e| vec![e])?,
        );

        let engine = Arc::new(Self {
            pipeline,
            pool,
            inventory,
            connector,
            config,
            shutdown: Shutdown::new(),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            server_task: Mutex::new(None),
        });
        Ok((engine, events_rx))
    }

    /// Begin accepting and dispatching on the given listener. Spawns the
    /// server, health monitor, and idle sweeper.
    pub async fn start(self: &Arc<Self>, listener: TcpListener) -> Result<(), std::io::Error> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("engine already started");
            return Ok(());
        }

        let monitor = HealthMonitor::new(
            self.inventory.clone(),
            self.connector.clone(),
            self.config.health_check.clone(),
        );
        tokio::spawn(monitor.run(self.shutdown.subscribe()));

        tokio::spawn(self.pool.clone().run_sweeper(self.shutdown.subscribe()));

        let server = HttpServer::new(self.pipeline.clone(), &self.config.timeouts);
        let server_shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            if let Err(e) = server.run(listener, server_shutdown).await {
                tracing::error!(error = %e, "HTTP server exited with error");
            }
        });
        *self.server_task.lock().await = Some(handle);

        Ok(())
    }

    /// Stop accepting, drain in-flight requests, release pooled
    /// connections. Idempotent; safe to call before start.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("engine already stopped");
            return;
        }

        tracing::info!("engine stopping");
        self.shutdown.trigger();

        if let Some(handle) = self.server_task.lock().await.take() {
            // Drain completes when graceful shutdown finishes.
            let _ = handle.await;
        }

        self.pool.drain();
        tracing::info!("engine stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OriginConfig, RouteConfig};

    fn config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.origins.push(OriginConfig {
            name: "o1".into(),
            group: "web".into(),
            address: "127.0.0.1:3000".into(),
        });
        config.routes.push(RouteConfig {
            name: "all".into(),
            host: None,
            path_prefix: Some("/".into()),
            headers: Default::default(),
            origin_group: "web".into(),
            priority: 0,
        });
        config
    }

    #[tokio::test]
    async fn test_start_then_stop_terminates_cleanly() {
        let (engine, _events) = Engine::new(config()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        engine.start(listener).await.unwrap();
        engine.stop().await;
        assert!(engine.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_twice_is_noop() {
        let (engine, _events) = Engine::new(config()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        engine.start(listener).await.unwrap();
        engine.stop().await;
        engine.stop().await;
        assert!(engine.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_before_start_is_safe() {
        let (engine, _events) = Engine::new(config()).unwrap();
        engine.stop().await;
        assert!(engine.is_stopped());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.routes[0].origin_group = "missing".into();
        assert!(Engine::new(bad).is_err());
    }
}

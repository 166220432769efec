//! Bounded per-origin connection pooling.
//!
//! # Responsibilities
//! - Enforce at most C live connections per origin
//! - Retain at most I idle connections for reuse
//! - Queue acquirers FIFO up to the acquire timeout
//! - Close idle connections past their idle lifetime

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

use crate::config::schema::PoolConfig;
use crate::errors::ProxyError;
use crate::events::{EventSink, ProxyEvent};
use crate::origins::origin::Origin;
use crate::pool::connection::{Connector, OriginConnection};

struct IdleConn {
    conn: Box<dyn OriginConnection>,
    parked_at: Instant,
}

/// Per-origin pool shard. The semaphore bounds live connections; the
/// deque holds idle ones awaiting reuse.
struct OriginShard {
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleConn>>,
}

/// Pool of reusable outbound connections, sharded per origin.
pub struct ConnectionPool {
    connector: Arc<dyn Connector>,
    config: PoolConfig,
    shards: DashMap<SocketAddr, Arc<OriginShard>>,
    events: EventSink,
}

impl ConnectionPool {
    pub fn new(connector: Arc<dyn Connector>, config: PoolConfig, events: EventSink) -> Self {
        Self {
            connector,
            config,
            shards: DashMap::new(),
            events,
        }
    }

    fn shard(&self, addr: SocketAddr) -> Arc<OriginShard> {
        self.shards
            .entry(addr)
            .or_insert_with(|| {
                Arc::new(OriginShard {
                    permits: Arc::new(Semaphore::new(self.config.max_per_origin)),
                    idle: Mutex::new(VecDeque::new()),
                })
            })
            .clone()
    }

    /// Acquire a connection to an origin: a live idle one when available,
    /// otherwise a fresh dial. Queues FIFO behind the per-origin cap and
    /// fails with PoolExhausted once the acquire timeout elapses.
    pub async fn acquire(&self, origin: Arc<Origin>) -> Result<PooledConnection, ProxyError> {
        let shard = self.shard(origin.addr);
        let acquire_timeout = Duration::from_millis(self.config.acquire_timeout_ms);

        let permit = match timeout(acquire_timeout, shard.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            // Closed semaphore means the pool is draining.
            Ok(Err(_)) | Err(_) => {
                self.events.emit(ProxyEvent::PoolExhausted {
                    origin: origin.name.clone(),
                });
                tracing::warn!(origin = %origin.name, "connection acquisition timed out");
                return Err(ProxyError::PoolExhausted {
                    origin: origin.name.clone(),
                });
            }
        };

        // Drain dead idle entries; reuse the first live one.
        loop {
            let parked = {
                let mut idle = shard.idle.lock().unwrap_or_else(|e| e.into_inner());
                idle.pop_front()
            };
            match parked {
                Some(entry) if entry.conn.is_open() => {
                    return Ok(PooledConnection {
                        conn: Some(entry.conn),
                        shard,
                        max_idle: self.config.max_idle,
                        origin,
                        _permit: permit,
                    });
                }
                Some(_dead) => continue,
                None => break,
            }
        }

        // Permit in hand, no idle connection: dial. A failed dial frees
        // the permit when it drops with this frame.
        let conn = self.connector.connect(origin.clone()).await?;
        Ok(PooledConnection {
            conn: Some(conn),
            shard,
            max_idle: self.config.max_idle,
            origin,
            _permit: permit,
        })
    }

    /// Close idle connections past the idle lifetime. Runs off the
    /// request path.
    pub fn sweep_idle(&self) {
        let lifetime = Duration::from_secs(self.config.idle_timeout_secs);
        for shard in self.shards.iter() {
            let mut idle = shard.idle.lock().unwrap_or_else(|e| e.into_inner());
            idle.retain(|entry| entry.parked_at.elapsed() < lifetime && entry.conn.is_open());
        }
    }

    /// Periodic sweep loop, stopped by the shutdown broadcast.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep_idle(),
                _ = shutdown.recv() => break,
            }
        }
    }

    /// Drop every idle connection. Called once in-flight requests have
    /// drained during shutdown.
    pub fn drain(&self) {
        for shard in self.shards.iter() {
            shard.idle.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    /// Idle connections currently parked for an origin.
    pub fn idle_count(&self, addr: SocketAddr) -> usize {
        self.shards
            .get(&addr)
            .map(|shard| shard.idle.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }
}

/// A connection checked out by exactly one in-flight request.
///
/// Dropping without an explicit release closes the connection: a request
/// cancelled mid-exchange cannot prove the connection state, so the pool
/// discards it.
pub struct PooledConnection {
    conn: Option<Box<dyn OriginConnection>>,
    shard: Arc<OriginShard>,
    max_idle: usize,
    origin: Arc<Origin>,
    _permit: OwnedSemaphorePermit,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("origin", &self.origin)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl PooledConnection {
    pub fn origin(&self) -> &Arc<Origin> {
        &self.origin
    }

    pub fn is_open(&self) -> bool {
        self.conn.as_ref().map(|c| c.is_open()).unwrap_or(false)
    }

    pub async fn send(
        &mut self,
        req: axum::http::Request<axum::body::Body>,
    ) -> Result<axum::http::Response<axum::body::Body>, ProxyError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(ProxyError::OriginProtocolError {
                origin: self.origin.name.clone(),
                source: "connection already released".into(),
            });
        };
        conn.send(req).await
    }

    /// Return the connection to the pool. Reusable connections park in
    /// the idle deque (up to max_idle); everything else closes. The
    /// permit is freed afterwards so a FIFO waiter sees the idle entry.
    pub fn release(mut self, reusable: bool) {
        if let Some(conn) = self.conn.take() {
            if reusable && conn.is_open() {
                let mut idle = self.shard.idle.lock().unwrap_or_else(|e| e.into_inner());
                if idle.len() < self.max_idle {
                    idle.push_back(IdleConn {
                        conn,
                        parked_at: Instant::now(),
                    });
                }
            }
        }
        // self drops here, releasing the permit.
    }
}

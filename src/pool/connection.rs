//! Connector abstraction and the HTTP/1.1 implementation.
//!
//! # Responsibilities
//! - Define the transport seam the pool dials through
//! - Implement it with a TCP connect plus hyper client handshake
//!
//! # Design Decisions
//! - Connect timeout is enforced here; it is one of the three
//!   independent outbound deadlines
//! - Each connection gets its own driver task; dropping the sender ends
//!   the task and closes the socket

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::errors::ProxyError;
use crate::origins::origin::Origin;

/// An open transport-level connection to one origin. Never shared by two
/// concurrent requests; exclusivity is enforced by the pool.
pub trait OriginConnection: Send {
    /// Exchange one request for one response. The response body may
    /// still be streaming when this resolves.
    fn send<'a>(
        &'a mut self,
        req: Request<Body>,
    ) -> BoxFuture<'a, Result<Response<Body>, ProxyError>>;

    /// False once the transport is known dead (not reusable).
    fn is_open(&self) -> bool;
}

/// Dials new connections to origins.
pub trait Connector: Send + Sync {
    fn connect<'a>(
        &'a self,
        origin: Arc<Origin>,
    ) -> BoxFuture<'a, Result<Box<dyn OriginConnection>, ProxyError>>;
}

/// HTTP/1.1 connector over TCP.
pub struct HttpConnector {
    connect_timeout: Duration,
}

impl HttpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for HttpConnector {
    fn connect<'a>(
        &'a self,
        origin: Arc<Origin>,
    ) -> BoxFuture<'a, Result<Box<dyn OriginConnection>, ProxyError>> {
        async move {
            let stream = match timeout(self.connect_timeout, TcpStream::connect(origin.addr)).await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    return Err(ProxyError::OriginConnectFailure {
                        origin: origin.name.clone(),
                        source: Box::new(e),
                    })
                }
                Err(_) => {
                    return Err(ProxyError::OriginTimeout {
                        origin: origin.name.clone(),
                    })
                }
            };
            let _ = stream.set_nodelay(true);

            let (sender, conn) = http1::handshake(TokioIo::new(stream)).await.map_err(|e| {
                ProxyError::OriginConnectFailure {
                    origin: origin.name.clone(),
                    source: Box::new(e),
                }
            })?;

            let driver_origin = origin.name.clone();
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(origin = %driver_origin, error = %e, "origin connection closed");
                }
            });

            Ok(Box::new(HttpConnection {
                sender,
                origin_name: origin.name.clone(),
            }) as Box<dyn OriginConnection>)
        }
        .boxed()
    }
}

/// One HTTP/1.1 connection driven by a background task.
struct HttpConnection {
    sender: http1::SendRequest<Body>,
    origin_name: String,
}

impl OriginConnection for HttpConnection {
    fn send<'a>(
        &'a mut self,
        req: Request<Body>,
    ) -> BoxFuture<'a, Result<Response<Body>, ProxyError>> {
        async move {
            self.sender
                .ready()
                .await
                .map_err(|e| ProxyError::OriginProtocolError {
                    origin: self.origin_name.clone(),
                    source: Box::new(e),
                })?;
            let resp = self.sender.send_request(req).await.map_err(|e| {
                ProxyError::OriginProtocolError {
                    origin: self.origin_name.clone(),
                    source: Box::new(e),
                }
            })?;
            Ok(resp.map(Body::new))
        }
        .boxed()
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

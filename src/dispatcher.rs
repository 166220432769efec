//! Request dispatcher: routes, selects, acquires, forwards, retries.
//!
//! # Data Flow
//! ```text
//! pipeline terminal
//!     → router snapshot lookup (group or direct handler)
//!     → attempt loop:
//!         inventory.select (skips unhealthy + already-tried origins)
//!         → pool.acquire → send with response deadline
//!         → success: passive health success, body guarded for pool return
//!         → failure: passive health failure, retry policy consulted
//!     → response, or terminal gateway error
//! ```
//!
//! # Design Decisions
//! - One logical asynchronous operation per request; no cross-request state
//! - Request bodies are buffered (up to a limit) so retries can replay
//!   them; oversized bodies stream with a single attempt
//! - The response returns to the pipeline as soon as headers arrive; the
//!   connection rejoins the pool when the body finishes streaming

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderValue, CONTENT_LENGTH, HOST};
use axum::http::request::Parts;
use axum::http::{Request, Response, StatusCode, Version};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::config::schema::{RetryConfig, TimeoutConfig};
use crate::errors::ProxyError;
use crate::events::{EventSink, ProxyEvent};
use crate::origins::inventory::OriginInventory;
use crate::origins::origin::Origin;
use crate::pipeline::interceptor::{Handler, ProxyRequest, ProxyResponse};
use crate::pool::body::GuardedBody;
use crate::pool::pool::ConnectionPool;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::retry::{Attempt, AttemptOutcome, RetryDecision, RetryPolicy};
use crate::routing::router::{Destination, RouterHandle};

/// Orchestrates one request end-to-end. Implements the pipeline terminal.
pub struct Dispatcher {
    router: RouterHandle,
    inventory: Arc<OriginInventory>,
    pool: Arc<ConnectionPool>,
    retry_policy: RetryPolicy,
    retry_config: RetryConfig,
    response_timeout: Duration,
    events: EventSink,
}

impl Dispatcher {
    pub fn new(
        router: RouterHandle,
        inventory: Arc<OriginInventory>,
        pool: Arc<ConnectionPool>,
        retry_config: RetryConfig,
        timeouts: TimeoutConfig,
        events: EventSink,
    ) -> Self {
        Self {
            router,
            inventory,
            pool,
            retry_policy: RetryPolicy::new(retry_config.max_retries),
            retry_config,
            response_timeout: Duration::from_millis(timeouts.response_ms),
            events,
        }
    }

    async fn dispatch(&self, req: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let destination = match self.router.load().route(&req) {
            Ok((_, destination)) => destination,
            Err(e) => {
                self.emit_completed(&method, &path, e.status_code().as_u16(), None, 0, start);
                return Err(e);
            }
        };

        match destination {
            Destination::Handler(handler) => handler.handle(req).await,
            Destination::Group(group) => self.forward(req, &group, &method, &path, start).await,
        }
    }

    async fn forward(
        &self,
        req: ProxyRequest,
        group: &str,
        method: &str,
        path: &str,
        start: Instant,
    ) -> Result<ProxyResponse, ProxyError> {
        let (parts, body) = req.into_parts();

        // A body we can clone per attempt makes the request replayable.
        // Bodies past the buffer limit stream through a single attempt.
        let declared = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        let replayable = self.retry_config.max_retries > 0
            && declared
                .map(|len| len <= self.retry_config.buffer_limit_bytes)
                .unwrap_or(true);

        let (buffered, mut streaming): (Option<Bytes>, Option<Body>) = if replayable {
            match axum::body::to_bytes(body, self.retry_config.buffer_limit_bytes).await {
                Ok(bytes) => (Some(bytes), None),
                Err(_) => {
                    // Undeclared body larger than the replay buffer; it is
                    // already partially consumed, so reject outright.
                    return Ok(Response::builder()
                        .status(StatusCode::PAYLOAD_TOO_LARGE)
                        .body(Body::empty())
                        .unwrap_or_default());
                }
            }
        } else {
            (None, Some(body))
        };

        let mut tried: Vec<SocketAddr> = Vec::new();
        let mut attempts: Vec<Attempt> = Vec::new();

        loop {
            let attempt_body = match &buffered {
                Some(bytes) => Body::from(bytes.clone()),
                None => streaming.take().unwrap_or_else(Body::empty),
            };
            let attempt_started = Instant::now();

            match self.try_once(&parts, attempt_body, group, &mut tried).await {
                Ok((resp, origin)) => {
                    attempts.push(Attempt {
                        origin: origin.name.clone(),
                        started: attempt_started,
                        outcome: AttemptOutcome::Responded(resp.status().as_u16()),
                    });
                    self.emit_completed(
                        method,
                        path,
                        resp.status().as_u16(),
                        Some(origin.name.clone()),
                        attempts.len() as u32,
                        start,
                    );
                    return Ok(resp);
                }
                Err((e, origin)) => {
                    let origin_name = origin.as_ref().map(|o| o.name.clone());
                    attempts.push(Attempt {
                        origin: origin_name.clone().unwrap_or_default(),
                        started: attempt_started,
                        outcome: AttemptOutcome::Failed(e.failure_kind()),
                    });

                    let attempts_made = attempts.len() as u32;
                    if self.retry_policy.decide(&e, attempts_made, false) == RetryDecision::Retry
                        && buffered.is_some()
                    {
                        let delay = calculate_backoff(
                            attempts_made,
                            self.retry_config.base_delay_ms,
                            self.retry_config.max_delay_ms,
                        );
                        tracing::info!(
                            group = %group,
                            attempt = attempts_made,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying against another origin"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    self.emit_completed(
                        method,
                        path,
                        e.status_code().as_u16(),
                        origin_name,
                        attempts_made,
                        start,
                    );
                    return Err(e);
                }
            }
        }
    }

    /// One attempt: select, acquire, send. Reports the passive health
    /// signal for the chosen origin.
    async fn try_once(
        &self,
        parts: &Parts,
        body: Body,
        group: &str,
        tried: &mut Vec<SocketAddr>,
    ) -> Result<(ProxyResponse, Arc<Origin>), (ProxyError, Option<Arc<Origin>>)> {
        let origin = self
            .inventory
            .select(group, tried)
            .map_err(|e| (e, None))?;
        tried.push(origin.addr);

        let mut conn = match self.pool.acquire(origin.clone()).await {
            Ok(conn) => conn,
            Err(e) => {
                // Connect-level failures count against the origin; pool
                // exhaustion is our own capacity, not the origin's fault.
                if e.is_retryable() {
                    self.inventory.record_failure(&origin);
                }
                self.events.emit(ProxyEvent::AttemptFailed {
                    origin: origin.name.clone(),
                    kind: e.failure_kind(),
                });
                return Err((e, Some(origin)));
            }
        };

        let outbound = match build_outbound(parts, body, &origin) {
            Ok(req) => req,
            Err(e) => return Err((e, Some(origin))),
        };

        match tokio::time::timeout(self.response_timeout, conn.send(outbound)).await {
            Ok(Ok(resp)) => {
                self.inventory.record_success(&origin);
                let (resp_parts, resp_body) = resp.into_parts();
                let guarded = Body::new(GuardedBody::new(resp_body, conn));
                Ok((Response::from_parts(resp_parts, guarded), origin))
            }
            Ok(Err(e)) => {
                self.inventory.record_failure(&origin);
                self.events.emit(ProxyEvent::AttemptFailed {
                    origin: origin.name.clone(),
                    kind: e.failure_kind(),
                });
                Err((e, Some(origin)))
            }
            Err(_) => {
                let e = ProxyError::OriginTimeout {
                    origin: origin.name.clone(),
                };
                self.inventory.record_failure(&origin);
                self.events.emit(ProxyEvent::AttemptFailed {
                    origin: origin.name.clone(),
                    kind: e.failure_kind(),
                });
                Err((e, Some(origin)))
            }
        }
    }

    fn emit_completed(
        &self,
        method: &str,
        path: &str,
        status: u16,
        origin: Option<String>,
        attempts: u32,
        start: Instant,
    ) {
        self.events.emit(ProxyEvent::RequestDispatched {
            method: method.to_string(),
            path: path.to_string(),
            status,
            origin,
            attempts,
            elapsed: start.elapsed(),
        });
    }
}

impl Handler for Dispatcher {
    fn handle<'a>(
        &'a self,
        req: ProxyRequest,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        self.dispatch(req).boxed()
    }
}

/// Rebuild the request in origin-form for the outbound connection.
/// Header order is preserved; only Host is adjusted for the origin.
fn build_outbound(
    parts: &Parts,
    body: Body,
    origin: &Origin,
) -> Result<Request<Body>, ProxyError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut req = Request::builder()
        .method(parts.method.clone())
        .uri(path_and_query)
        .version(Version::HTTP_11)
        .body(body)
        .map_err(|e| ProxyError::OriginProtocolError {
            origin: origin.name.clone(),
            source: Box::new(e),
        })?;

    *req.headers_mut() = parts.headers.clone();
    if !req.headers().contains_key(HOST) {
        let host = HeaderValue::from_str(&origin.addr.to_string()).map_err(|e| {
            ProxyError::OriginProtocolError {
                origin: origin.name.clone(),
                source: Box::new(e),
            }
        })?;
        req.headers_mut().insert(HOST, host);
    }

    Ok(req)
}

//! Interceptor and handler capability traits.
//!
//! # Responsibilities
//! - Define the object-safe async contract for transforms and terminals
//! - Provide the continuation (`Next`) that represents the rest of the chain
//!
//! # Design Decisions
//! - Boxed futures keep the traits object-safe so chains can mix concrete
//!   interceptor types behind `Arc<dyn Interceptor>`
//! - `Next` is consumed by value: an interceptor can invoke the rest of
//!   the chain at most once per request

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;

use crate::errors::ProxyError;

/// The request shape flowing through the pipeline. Extensions serve as
/// the per-request attribute bag.
pub type ProxyRequest = Request<Body>;

/// The response shape produced by the pipeline.
pub type ProxyResponse = Response<Body>;

/// A terminal unit: consumes a request, eventually produces a response.
pub trait Handler: Send + Sync {
    fn handle<'a>(
        &'a self,
        req: ProxyRequest,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>>;
}

/// Adapter so closures can serve as handlers (defaults, tests).
pub struct HandlerFn<F>(pub F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(ProxyRequest) -> BoxFuture<'static, Result<ProxyResponse, ProxyError>> + Send + Sync,
{
    fn handle<'a>(
        &'a self,
        req: ProxyRequest,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        (self.0)(req)
    }
}

/// A named transform in the chain.
///
/// Implementations may call the continuation and transform its result,
/// short-circuit with their own response, or fail with a `ProxyError`.
pub trait Interceptor: Send + Sync {
    /// Stable name for logging and failure attribution.
    fn name(&self) -> &str;

    fn handle<'a>(
        &'a self,
        req: ProxyRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>>;
}

/// The remainder of the chain: zero or more interceptors plus the terminal.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Interceptor>],
    terminal: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a [Arc<dyn Interceptor>], terminal: &'a dyn Handler) -> Self {
        Self { rest, terminal }
    }

    /// Invoke the rest of the chain.
    pub fn run(self, req: ProxyRequest) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        match self.rest.split_first() {
            Some((head, tail)) => head.handle(req, Next::new(tail, self.terminal)),
            None => self.terminal.handle(req),
        }
    }
}

//! Proxy error taxonomy.
//!
//! # Responsibilities
//! - Classify every failure the request path can produce
//! - Map each failure category to a gateway-class status code
//! - Decide retryability (transport-level failures only)
//!
//! # Design Decisions
//! - Routing and pool-exhaustion failures are never retried; retrying
//!   would not change the outcome
//! - Origin-returned error statuses are not errors here; they pass
//!   through verbatim
//! - Interceptor failures are terminal: side effects may already have
//!   occurred

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed source for transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All failure categories the request path can surface.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No route matched and no default destination is configured.
    #[error("no route matched the request")]
    RouteNotFound,

    /// The load balancer found zero healthy candidates in the group.
    #[error("no healthy origins available in group '{group}'")]
    NoOriginsAvailable { group: String },

    /// Connection acquisition timed out at the pool.
    #[error("connection pool exhausted for origin '{origin}'")]
    PoolExhausted { origin: String },

    /// TCP connect or protocol handshake to the origin failed.
    #[error("failed to connect to origin '{origin}': {source}")]
    OriginConnectFailure { origin: String, source: BoxError },

    /// The origin did not respond (connect or response) within its deadline.
    #[error("origin '{origin}' timed out")]
    OriginTimeout { origin: String },

    /// The origin connection broke mid-exchange.
    #[error("protocol error from origin '{origin}': {source}")]
    OriginProtocolError { origin: String, source: BoxError },

    /// An interceptor raised an error. Terminal, never retried.
    #[error("interceptor '{name}' failed: {message}")]
    InterceptorFailure { name: String, message: String },
}

/// Stable label for a failure category, used in events and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RouteNotFound,
    NoOriginsAvailable,
    PoolExhausted,
    ConnectFailure,
    Timeout,
    ProtocolError,
    InterceptorFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RouteNotFound => "route_not_found",
            FailureKind::NoOriginsAvailable => "no_origins_available",
            FailureKind::PoolExhausted => "pool_exhausted",
            FailureKind::ConnectFailure => "connect_failure",
            FailureKind::Timeout => "timeout",
            FailureKind::ProtocolError => "protocol_error",
            FailureKind::InterceptorFailure => "interceptor_failure",
        }
    }
}

impl ProxyError {
    /// The gateway-class status code surfaced to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::RouteNotFound => StatusCode::NOT_FOUND,
            ProxyError::NoOriginsAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::PoolExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::OriginConnectFailure { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::OriginTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::OriginProtocolError { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::InterceptorFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True only for transport-level failures that happened before any
    /// response bytes were produced.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProxyError::OriginConnectFailure { .. }
                | ProxyError::OriginTimeout { .. }
                | ProxyError::OriginProtocolError { .. }
        )
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ProxyError::RouteNotFound => FailureKind::RouteNotFound,
            ProxyError::NoOriginsAvailable { .. } => FailureKind::NoOriginsAvailable,
            ProxyError::PoolExhausted { .. } => FailureKind::PoolExhausted,
            ProxyError::OriginConnectFailure { .. } => FailureKind::ConnectFailure,
            ProxyError::OriginTimeout { .. } => FailureKind::Timeout,
            ProxyError::OriginProtocolError { .. } => FailureKind::ProtocolError,
            ProxyError::InterceptorFailure { .. } => FailureKind::InterceptorFailure,
        }
    }
}

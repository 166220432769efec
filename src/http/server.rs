//! HTTP server setup and request entry point.
//!
//! # Responsibilities
//! - Build the axum router with the catch-all proxy handler
//! - Wire up middleware (trace, request timeout)
//! - Serve with graceful shutdown on the lifecycle broadcast
//! - Map pipeline errors to client-facing gateway responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::TimeoutConfig;
use crate::errors::ProxyError;
use crate::pipeline::chain::Pipeline;

/// Application state injected into the proxy handler.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

/// HTTP server hosting the interceptor pipeline.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(pipeline: Arc<Pipeline>, timeouts: &TimeoutConfig) -> Self {
        let state = AppState { pipeline };
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Serve until the shutdown broadcast fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Feed every inbound request through the pipeline.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> impl IntoResponse {
    match state.pipeline.process(request).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

/// Gateway-class error response for a failed request. The status encodes
/// the failure category; the body is a terse operator-readable line.
pub fn error_response(error: &ProxyError) -> Response<Body> {
    let status = error.status_code();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(error.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_response_carries_category_status() {
        let resp = error_response(&ProxyError::RouteNotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = error_response(&ProxyError::OriginTimeout { origin: "a".into() });
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

        let resp = error_response(&ProxyError::NoOriginsAvailable { group: "web".into() });
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

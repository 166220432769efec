//! Built-in interceptors registered from configuration.

use std::collections::HashMap;
use std::time::Instant;

use axum::http::header::{HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use uuid::Uuid;

use crate::config::validation::ValidationError;
use crate::errors::ProxyError;
use crate::pipeline::interceptor::{Interceptor, Next, ProxyRequest, ProxyResponse};

/// Per-request identifier, stored in the request's extensions so later
/// interceptors and the dispatcher can correlate log lines.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub const X_REQUEST_ID: &str = "x-request-id";

/// Tags every request with a UUID v4, honoring an id supplied by the client.
pub struct RequestIdInterceptor;

impl Interceptor for RequestIdInterceptor {
    fn name(&self) -> &str {
        "request-id"
    }

    fn handle<'a>(
        &'a self,
        mut req: ProxyRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&id) {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }
        req.extensions_mut().insert(RequestId(id.clone()));

        async move {
            let mut resp = next.run(req).await?;
            if let Ok(value) = HeaderValue::from_str(&id) {
                resp.headers_mut().insert(X_REQUEST_ID, value);
            }
            Ok(resp)
        }
        .boxed()
    }
}

/// Logs a summary line around the rest of the chain.
pub struct AccessLog;

impl Interceptor for AccessLog {
    fn name(&self) -> &str {
        "access-log"
    }

    fn handle<'a>(
        &'a self,
        req: ProxyRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        let start = Instant::now();

        async move {
            let result = next.run(req).await;
            match &result {
                Ok(resp) => tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = resp.status().as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "request completed"
                ),
                Err(e) => tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "request failed"
                ),
            }
            result
        }
        .boxed()
    }
}

/// Sets and removes headers on requests and responses.
///
/// Header names and values are validated at construction so the hot path
/// never parses config strings.
pub struct HeaderRewrite {
    set_request: Vec<(HeaderName, HeaderValue)>,
    set_response: Vec<(HeaderName, HeaderValue)>,
    remove_request: Vec<HeaderName>,
    remove_response: Vec<HeaderName>,
}

impl HeaderRewrite {
    pub fn new(
        set_request: &HashMap<String, String>,
        set_response: &HashMap<String, String>,
        remove_request: &[String],
        remove_response: &[String],
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            set_request: parse_pairs(set_request)?,
            set_response: parse_pairs(set_response)?,
            remove_request: parse_names(remove_request)?,
            remove_response: parse_names(remove_response)?,
        })
    }
}

fn parse_pairs(
    pairs: &HashMap<String, String>,
) -> Result<Vec<(HeaderName, HeaderValue)>, ValidationError> {
    let mut out = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ValidationError {
            field: format!("interceptors.header_rewrite.{}", name),
            message: "invalid header name".into(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| ValidationError {
            field: format!("interceptors.header_rewrite.{}", name),
            message: "invalid header value".into(),
        })?;
        out.push((name, value));
    }
    Ok(out)
}

fn parse_names(names: &[String]) -> Result<Vec<HeaderName>, ValidationError> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| ValidationError {
                field: format!("interceptors.header_rewrite.{}", name),
                message: "invalid header name".into(),
            })
        })
        .collect()
}

impl Interceptor for HeaderRewrite {
    fn name(&self) -> &str {
        "header-rewrite"
    }

    fn handle<'a>(
        &'a self,
        mut req: ProxyRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ProxyResponse, ProxyError>> {
        for (name, value) in &self.set_request {
            req.headers_mut().insert(name.clone(), value.clone());
        }
        for name in &self.remove_request {
            req.headers_mut().remove(name);
        }

        async move {
            let mut resp = next.run(req).await?;
            for (name, value) in &self.set_response {
                resp.headers_mut().insert(name.clone(), value.clone());
            }
            for name in &self.remove_response {
                resp.headers_mut().remove(name);
            }
            Ok(resp)
        }
        .boxed()
    }
}

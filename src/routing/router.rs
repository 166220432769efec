//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in priority order
//! - Look up the destination for a request
//! - Fall back to the configured default destination
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - RouterHandle swaps whole snapshots for reconfiguration
//! - O(n) ordered scan (acceptable for typical route counts)
//! - No match with no default is an explicit RouteNotFound, not a panic

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::header::HeaderName;

use crate::config::schema::RouteConfig;
use crate::config::validation::ValidationError;
use crate::errors::ProxyError;
use crate::pipeline::interceptor::{Handler, ProxyRequest};
use crate::routing::matcher::{AndMatcher, HeaderMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// Where a matched request goes.
#[derive(Clone)]
pub enum Destination {
    /// Forward to an origin group through the dispatcher.
    Group(String),
    /// Serve directly from a terminal handler.
    Handler(Arc<dyn Handler>),
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Group(name) => write!(f, "Group({})", name),
            Destination::Handler(_) => write!(f, "Handler"),
        }
    }
}

/// A compiled route rule.
pub struct Route {
    pub name: String,
    pub priority: u32,
    matcher: AndMatcher,
    pub destination: Destination,
}

impl Route {
    pub fn from_config(config: &RouteConfig) -> Result<Self, ValidationError> {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &config.host {
            matchers.push(Box::new(HostMatcher::new(host.clone())));
        }
        if let Some(prefix) = &config.path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ValidationError {
                field: format!("routes.{}.headers.{}", config.name, name),
                message: "invalid header name".into(),
            })?;
            matchers.push(Box::new(HeaderMatcher::new(name, value.clone())));
        }
        Ok(Self {
            name: config.name.clone(),
            priority: config.priority,
            matcher: AndMatcher::new(matchers),
            destination: Destination::Group(config.origin_group.clone()),
        })
    }
}

/// An immutable snapshot of the active rule set.
pub struct Router {
    routes: Vec<Route>,
    default: Option<Destination>,
}

impl Router {
    /// Compile routes, sorting by descending priority. The sort is stable,
    /// so equal priorities keep declaration order.
    pub fn new(mut routes: Vec<Route>, default: Option<Destination>) -> Self {
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes, default }
    }

    pub fn from_config(
        configs: &[RouteConfig],
        default: Option<Destination>,
    ) -> Result<Self, ValidationError> {
        let routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(routes, default))
    }

    /// Find the destination for a request. First matching rule wins; no
    /// match falls back to the default.
    pub fn route(&self, req: &ProxyRequest) -> Result<(Option<&str>, Destination), ProxyError> {
        for route in &self.routes {
            if route.matcher.matches(req) {
                return Ok((Some(route.name.as_str()), route.destination.clone()));
            }
        }
        match &self.default {
            Some(dest) => Ok((None, dest.clone())),
            None => Err(ProxyError::RouteNotFound),
        }
    }
}

/// Shared handle over the active router snapshot.
///
/// Requests load the snapshot once and use it for their whole lifetime;
/// replacing the snapshot never tears an in-flight request.
#[derive(Clone)]
pub struct RouterHandle {
    inner: Arc<ArcSwap<Router>>,
}

impl RouterHandle {
    pub fn new(router: Router) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Router> {
        self.inner.load_full()
    }

    /// Atomically install a new rule set.
    pub fn replace(&self, router: Router) {
        self.inner.store(Arc::new(router));
    }
}

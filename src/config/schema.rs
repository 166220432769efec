//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Route rules mapping requests to origin groups.
    pub routes: Vec<RouteConfig>,

    /// Origin group to use when no route matches. None means 404.
    pub default_group: Option<String>,

    /// Origin server definitions.
    pub origins: Vec<OriginConfig>,

    /// Outbound connection pool limits.
    pub pool: PoolConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry policy for transport-level failures.
    pub retries: RetryConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Ordered interceptor chain applied to every request.
    pub interceptors: Vec<InterceptorConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent inbound connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Route rule mapping requests to an origin group.
///
/// All present conditions must match (AND). Absent conditions are
/// wildcards. Rules are evaluated by descending priority; ties keep
/// declaration order; first match wins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact, case-insensitive).
    pub host: Option<String>,

    /// Path prefix to match (case-sensitive).
    pub path_prefix: Option<String>,

    /// Header name/value pairs that must match exactly.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Origin group to forward to.
    pub origin_group: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin identifier.
    pub name: String,

    /// Origin group this server belongs to.
    pub group: String,

    /// Origin address (e.g., "127.0.0.1:3000").
    pub address: String,
}

/// Outbound connection pool limits, applied per origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum concurrent connections per origin (C).
    pub max_per_origin: usize,

    /// Maximum idle connections retained per origin (I <= C).
    pub max_idle: usize,

    /// Idle connections older than this are closed by the sweep.
    pub idle_timeout_secs: u64,

    /// How long an acquire may queue before failing with PoolExhausted.
    pub acquire_timeout_ms: u64,

    /// Interval of the idle sweep task.
    pub sweep_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_per_origin: 32,
            max_idle: 8,
            idle_timeout_secs: 60,
            acquire_timeout_ms: 1_000,
            sweep_interval_secs: 10,
        }
    }
}

/// Timeout configuration for the three independent outbound deadlines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin TCP connect timeout in milliseconds.
    pub connect_ms: u64,

    /// Origin response (headers) timeout in milliseconds.
    pub response_ms: u64,

    /// Total inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            response_ms: 30_000,
            request_secs: 60,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt. 0 disables retries.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Request bodies up to this size are buffered so they can be
    /// replayed on retry. Larger bodies are streamed with one attempt.
    pub buffer_limit_bytes: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 50,
            max_delay_ms: 1_000,
            buffer_limit_bytes: 1024 * 1024,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active recovery probes.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/health".to_string(),
            unhealthy_threshold: 3,
        }
    }
}

/// One entry in the ordered interceptor chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterceptorConfig {
    /// Tag every request with a UUID v4 request id.
    RequestId,

    /// Log request/response summaries around the rest of the chain.
    AccessLog,

    /// Set or remove headers on the request and response.
    HeaderRewrite {
        #[serde(default)]
        set_request: HashMap<String, String>,
        #[serde(default)]
        set_response: HashMap<String, String>,
        #[serde(default)]
        remove_request: Vec<String>,
        #[serde(default)]
        remove_response: Vec<String>,
    },
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

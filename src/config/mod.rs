//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once at engine construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the assembled pipeline/router is a
//!   snapshot, never mutated mid-request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::{
    HealthCheckConfig, InterceptorConfig, ListenerConfig, OriginConfig, PoolConfig, ProxyConfig,
    RetryConfig, RouteConfig, TimeoutConfig,
};

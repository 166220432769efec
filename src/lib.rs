//! Viaduct: an HTTP reverse proxy core.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                     VIADUCT                       │
//!                       │                                                   │
//!   Client Request      │  ┌────────┐   ┌───────────┐   ┌──────────────┐  │
//!   ────────────────────┼─▶│  http  │──▶│ pipeline  │──▶│  dispatcher  │  │
//!                       │  │ server │   │(intercept)│   │              │  │
//!                       │  └────────┘   └───────────┘   └──────┬───────┘  │
//!                       │                                       │          │
//!                       │               ┌───────────┐   ┌──────▼───────┐  │
//!                       │               │  routing  │◀──│   origins    │  │
//!                       │               │           │   │ + balancer   │  │
//!                       │               └───────────┘   └──────┬───────┘  │
//!                       │                                       │          │
//!   Client Response     │  ┌────────────┐                ┌─────▼──────┐   │
//!   ◀───────────────────┼──│  guarded   │◀───────────────│    pool    │◀──┼── Origin
//!                       │  │   body     │                │ (per-origin)│   │   Server
//!                       │  └────────────┘                └────────────┘   │
//!                       │                                                   │
//!                       │  ┌─────────────────────────────────────────────┐ │
//!                       │  │            Cross-Cutting Concerns            │ │
//!                       │  │  config  health  resilience  lifecycle      │ │
//!                       │  │  events  observability  errors              │ │
//!                       │  └─────────────────────────────────────────────┘ │
//!                       └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod http;
pub mod pipeline;
pub mod routing;

// Traffic management
pub mod health;
pub mod load_balancer;
pub mod origins;
pub mod pool;

// Cross-cutting concerns
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{load_config, ProxyConfig};
pub use engine::Engine;
pub use errors::ProxyError;
pub use events::{EventSink, ProxyEvent};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (engine.rs):
//!     Validated config → wire components → spawn server + background tasks
//!
//! Shutdown (shutdown.rs):
//!     stop() or signal → broadcast → stop accepting → drain in-flight
//!     → release pooled connections
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close pools
//! - stop() is idempotent and safe from any state

pub mod shutdown;

pub use shutdown::Shutdown;

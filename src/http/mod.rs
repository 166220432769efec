//! HTTP transport adapter subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum catch-all, protocol handling via hyper)
//!     → pipeline.process(request)
//!     → Ok(response): streamed back to the client
//!     → Err(ProxyError): mapped to a gateway-class error response
//! ```
//!
//! # Design Decisions
//! - The adapter is a thin shell: all proxy semantics live behind the
//!   pipeline; swapping the listener (e.g. a TLS variant) needs no core
//!   changes
//! - Request timeout and trace layers wrap the whole pipeline
//! - Every request resolves: a response or a mapped error, never a
//!   half-written connection

pub mod server;

pub use server::HttpServer;

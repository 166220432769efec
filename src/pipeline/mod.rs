//! Interceptor pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → interceptor 1 (request phase)
//!     → interceptor 2
//!     → ...
//!     → terminal handler (dispatcher)
//!     → ... (response phase, implicit reverse order)
//!     → interceptor 2
//!     → interceptor 1
//!     → response to transport adapter
//! ```
//!
//! # Design Decisions
//! - Each interceptor receives the request plus a continuation (`Next`)
//!   for the rest of the chain; wrapping the continuation's result gives
//!   reverse-order response handling for free
//! - The chain is assembled once at construction and never mutated;
//!   per-request context travels in the request's extensions
//! - Interceptors may short-circuit (produce a response without calling
//!   the continuation) or fail; failures are terminal, never retried

pub mod builtin;
pub mod chain;
pub mod interceptor;

pub use chain::Pipeline;
pub use interceptor::{Handler, HandlerFn, Interceptor, Next, ProxyRequest, ProxyResponse};

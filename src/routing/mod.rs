//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (evaluate match conditions)
//!     → Destination (origin group or terminal handler) or default
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Sort by priority desc, ties by declaration order
//!     → Compile matchers
//!     → Freeze as immutable Router snapshot
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime; reconfiguration
//!   swaps a whole snapshot through RouterHandle (no torn reads)
//! - No regex in hot path (exact host, prefix path, exact header)
//! - First match wins; no match falls back to the configured default
//! - Matching is stateless and side-effect-free

pub mod matcher;
pub mod router;

pub use router::{Destination, Route, Router, RouterHandle};

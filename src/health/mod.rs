//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive signals (origins::inventory):
//!     attempt outcome observed by the dispatcher
//!     → failure counter / HEALTHY mark on the shared Origin
//!
//! Active probes (active.rs):
//!     periodic timer
//!     → probe UNHEALTHY origins out-of-band
//!     → successful probe → HEALTHY, counters reset
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary: passive traffic marks
//!   origins down, probes bring them back
//! - Probes dial fresh connections through the connector; they never
//!   consume pool permits or sit in the request path
//! - Probing only UNHEALTHY origins keeps the probe load proportional
//!   to the amount of trouble

pub mod active;

pub use active::HealthMonitor;

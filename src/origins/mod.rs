//! Origin inventory and health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive signals (dispatcher attempt outcomes):
//!     success → origin marked HEALTHY, counters reset
//!     transport failure → failure counter++, at threshold → UNHEALTHY
//!
//! Active probes (health::active):
//!     periodic probe of UNHEALTHY origins
//!     → successful probe → HEALTHY, counters reset
//!
//! Selection (dispatcher):
//!     inventory.select(group, tried)
//!     → round-robin over available origins
//!     → NoOriginsAvailable when the group has zero candidates
//! ```
//!
//! # Design Decisions
//! - Exactly one authoritative Origin instance per configured origin,
//!   shared via Arc across all requests
//! - Health state lives in per-origin atomics; no lock spans origins
//! - Transition methods report the transition so callers emit each
//!   health event exactly once

pub mod inventory;
pub mod origin;

pub use inventory::OriginInventory;
pub use origin::{HealthState, Origin};

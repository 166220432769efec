//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → origin group identified
//!     → inventory supplies the group's origin list
//!     → round_robin.rs rotates through available origins
//!     → already-tried origins skipped unless no alternative exists
//!     → Arc<Origin> or no candidate (NoOriginsAvailable upstream)
//! ```
//!
//! # Design Decisions
//! - Selector state is one atomic cursor per group; the cursor advances
//!   on every call regardless of outcome (fairness over many calls)
//! - Ties break by rotation order, never randomly, so selection is
//!   deterministic and testable
//! - Unhealthy origins are always excluded from selection

pub mod round_robin;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::origins::origin::Origin;

/// Strategy for picking one origin out of a group.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Select an available origin, preferring ones not in `tried`.
    /// Returns None when the group has no available candidate at all.
    fn select(&self, origins: &[Arc<Origin>], tried: &[SocketAddr]) -> Option<Arc<Origin>>;
}

//! Observability event surface.
//!
//! # Responsibilities
//! - Define the discrete events the core emits
//! - Provide a sink that never blocks the request path
//!
//! # Design Decisions
//! - Unbounded channel: emission is fire-and-forget, a slow or absent
//!   consumer must not stall a request
//! - Events carry identifiers and categories, not full messages; the
//!   consumer decides how to log or count them

use std::time::Duration;

use tokio::sync::mpsc;

use crate::errors::FailureKind;
use crate::origins::origin::HealthState;

/// Discrete events emitted at defined points in the request path.
#[derive(Debug, Clone)]
pub enum ProxyEvent {
    /// A request completed end-to-end (success or surfaced failure).
    RequestDispatched {
        method: String,
        path: String,
        status: u16,
        origin: Option<String>,
        attempts: u32,
        elapsed: Duration,
    },
    /// One attempt against one origin failed.
    AttemptFailed { origin: String, kind: FailureKind },
    /// An origin's health state transitioned.
    OriginHealthChanged {
        origin: String,
        from: HealthState,
        to: HealthState,
    },
    /// Connection acquisition timed out for an origin.
    PoolExhausted { origin: String },
}

/// Non-blocking sender side of the event channel.
///
/// Cloned freely into every component that emits. A dropped receiver is
/// tolerated: emission becomes a no-op.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ProxyEvent>,
}

impl EventSink {
    /// Create a sink and its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProxyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. Never blocks, never fails the caller.
    pub fn emit(&self, event: ProxyEvent) {
        let _ = self.tx.send(event);
    }
}

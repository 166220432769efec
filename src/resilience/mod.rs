//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt k fails:
//!     → retry.rs classifies (transport-level? response started? bound?)
//!     → Retry: backoff.rs delay, then a fresh origin selection
//!     → Fail: the observed failure surfaces as a gateway error
//! ```
//!
//! # Design Decisions
//! - Only transport-level failures that happened before any response
//!   bytes reached the client are retried
//! - Origin-returned error statuses pass through verbatim; retrying
//!   them would break idempotency expectations
//! - Routing and pool-exhaustion failures are never retried
//! - Jittered exponential backoff between attempts

pub mod backoff;
pub mod retry;

pub use retry::{Attempt, AttemptOutcome, RetryDecision, RetryPolicy};

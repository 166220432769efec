//! Retry decision logic.
//!
//! # Responsibilities
//! - Record the outcome of each dispatch attempt
//! - Decide whether a failed attempt is retried against another origin

use std::time::Instant;

use crate::errors::{FailureKind, ProxyError};

/// One try of dispatching a request to one origin.
#[derive(Debug)]
pub struct Attempt {
    pub origin: String,
    pub started: Instant,
    pub outcome: AttemptOutcome,
}

#[derive(Debug)]
pub enum AttemptOutcome {
    /// The origin produced a response (any status).
    Responded(u16),
    /// The attempt failed before a response materialized.
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-invoke selection and acquisition against a fresh origin.
    Retry,
    /// Surface the observed failure.
    Fail,
}

/// Fixed-bound retry policy over transport-level failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Decide the fate of a failed attempt. `attempts_made` counts the
    /// attempts already performed, including the failed one.
    pub fn decide(
        &self,
        error: &ProxyError,
        attempts_made: u32,
        response_started: bool,
    ) -> RetryDecision {
        if response_started {
            return RetryDecision::Fail;
        }
        if !error.is_retryable() {
            return RetryDecision::Fail;
        }
        if attempts_made > self.max_retries {
            return RetryDecision::Fail;
        }
        RetryDecision::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_err() -> ProxyError {
        ProxyError::OriginTimeout { origin: "a".into() }
    }

    #[test]
    fn test_transport_failure_retried_up_to_bound() {
        let policy = RetryPolicy::new(2);
        assert_eq!(policy.decide(&timeout_err(), 1, false), RetryDecision::Retry);
        assert_eq!(policy.decide(&timeout_err(), 2, false), RetryDecision::Retry);
        assert_eq!(policy.decide(&timeout_err(), 3, false), RetryDecision::Fail);
    }

    #[test]
    fn test_zero_bound_never_retries() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.decide(&timeout_err(), 1, false), RetryDecision::Fail);
    }

    #[test]
    fn test_non_transport_failures_never_retried() {
        let policy = RetryPolicy::new(3);
        assert_eq!(
            policy.decide(&ProxyError::RouteNotFound, 1, false),
            RetryDecision::Fail
        );
        assert_eq!(
            policy.decide(
                &ProxyError::PoolExhausted { origin: "a".into() },
                1,
                false
            ),
            RetryDecision::Fail
        );
        assert_eq!(
            policy.decide(
                &ProxyError::InterceptorFailure {
                    name: "auth".into(),
                    message: "boom".into()
                },
                1,
                false
            ),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_no_retry_once_response_started() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.decide(&timeout_err(), 1, true), RetryDecision::Fail);
    }
}

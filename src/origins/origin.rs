//! A single origin server and its health state.
//!
//! # Responsibilities
//! - Identify one backend instance (name, group, address)
//! - Track health state driven by passive signals and active probes
//!
//! # State Transitions
//! ```text
//! Unknown → Healthy     first successful attempt or probe
//! Healthy → Unhealthy   consecutive failures >= unhealthy_threshold
//! Unhealthy → Healthy   successful recovery probe (or attempt)
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// A single origin server.
#[derive(Debug)]
pub struct Origin {
    /// Unique origin identifier.
    pub name: String,
    /// Origin group this server belongs to.
    pub group: String,
    /// The address requests are dialed to.
    pub addr: SocketAddr,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Consecutive failure count since the last success.
    consecutive_failures: AtomicUsize,
    /// When the state was last updated by a signal or probe.
    last_checked: Mutex<Option<Instant>>,
}

impl Origin {
    pub fn new(name: impl Into<String>, group: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            addr,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            last_checked: Mutex::new(None),
        }
    }

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    /// Origins are selectable unless known-unhealthy; Unknown origins
    /// receive traffic so they can prove themselves.
    pub fn is_available(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Record a successful attempt or probe. Returns the transition if
    /// the state changed.
    pub fn record_success(&self) -> Option<(HealthState, HealthState)> {
        self.consecutive_failures.store(0, Ordering::Release);
        self.touch();
        let prev = HealthState::from(
            self.state
                .swap(HealthState::Healthy as u8, Ordering::AcqRel),
        );
        (prev != HealthState::Healthy).then_some((prev, HealthState::Healthy))
    }

    /// Record a connection-level failure. Transitions to Unhealthy once
    /// `threshold` consecutive failures accumulate.
    pub fn record_failure(&self, threshold: u32) -> Option<(HealthState, HealthState)> {
        self.touch();
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures < threshold as usize {
            return None;
        }
        let prev = HealthState::from(
            self.state
                .swap(HealthState::Unhealthy as u8, Ordering::AcqRel),
        );
        (prev != HealthState::Unhealthy).then_some((prev, HealthState::Unhealthy))
    }

    pub fn last_checked(&self) -> Option<Instant> {
        *self.last_checked.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self) {
        *self.last_checked.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("o1", "web", "127.0.0.1:3000".parse().unwrap())
    }

    #[test]
    fn test_starts_unknown_and_available() {
        let o = origin();
        assert_eq!(o.health(), HealthState::Unknown);
        assert!(o.is_available());
        assert!(o.last_checked().is_none());
    }

    #[test]
    fn test_first_success_transitions_to_healthy() {
        let o = origin();
        let transition = o.record_success();
        assert_eq!(transition, Some((HealthState::Unknown, HealthState::Healthy)));
        assert!(o.record_success().is_none()); // already healthy, no event
        assert!(o.last_checked().is_some());
    }

    #[test]
    fn test_failure_threshold_marks_unhealthy() {
        let o = origin();
        o.record_success();

        assert!(o.record_failure(3).is_none());
        assert!(o.record_failure(3).is_none());
        let transition = o.record_failure(3);
        assert_eq!(
            transition,
            Some((HealthState::Healthy, HealthState::Unhealthy))
        );
        assert!(!o.is_available());
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let o = origin();
        o.record_failure(3);
        o.record_failure(3);
        o.record_success();

        // Streak restarted, two more failures are not enough.
        assert!(o.record_failure(3).is_none());
        assert!(o.record_failure(3).is_none());
        assert!(o.is_available());
    }

    #[test]
    fn test_recovery_transition() {
        let o = origin();
        o.record_failure(1);
        assert_eq!(o.health(), HealthState::Unhealthy);

        let transition = o.record_success();
        assert_eq!(
            transition,
            Some((HealthState::Unhealthy, HealthState::Healthy))
        );
        assert!(o.is_available());
    }
}

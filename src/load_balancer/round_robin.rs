//! Round-robin load balancing strategy.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::LoadBalancer;
use crate::origins::origin::Origin;

/// Round-robin selector.
/// Stores an internal counter to rotate through origins.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn select(&self, origins: &[Arc<Origin>], tried: &[SocketAddr]) -> Option<Arc<Origin>> {
        if origins.is_empty() {
            return None;
        }

        // The cursor advances on every call, even when selection fails.
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let len = origins.len();

        // First pass: available and not tried yet.
        for i in 0..len {
            let origin = &origins[(start + i) % len];
            if origin.is_available() && !tried.contains(&origin.addr) {
                return Some(origin.clone());
            }
        }

        // Second pass: a retry may revisit a tried origin when it is the
        // only candidate left.
        for i in 0..len {
            let origin = &origins[(start + i) % len];
            if origin.is_available() {
                return Some(origin.clone());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn origin(port: u16) -> Arc<Origin> {
        Arc::new(Origin::new(
            format!("o{}", port),
            "web",
            format!("127.0.0.1:{}", port).parse().unwrap(),
        ))
    }

    #[test]
    fn test_rotates_through_origins() {
        let lb = RoundRobin::new();
        let origins = vec![origin(8080), origin(8081)];

        let s1 = lb.select(&origins, &[]).unwrap();
        assert_eq!(s1.addr, origins[0].addr);

        let s2 = lb.select(&origins, &[]).unwrap();
        assert_eq!(s2.addr, origins[1].addr);

        let s3 = lb.select(&origins, &[]).unwrap();
        assert_eq!(s3.addr, origins[0].addr);
    }

    #[test]
    fn test_fair_share_over_many_calls() {
        let lb = RoundRobin::new();
        let origins = vec![origin(8080), origin(8081), origin(8082)];
        let total = 90;

        let mut counts: HashMap<SocketAddr, usize> = HashMap::new();
        for _ in 0..total {
            let chosen = lb.select(&origins, &[]).unwrap();
            *counts.entry(chosen.addr).or_default() += 1;
        }

        let even_share = total / origins.len();
        for origin in &origins {
            assert_eq!(counts[&origin.addr], even_share);
        }
    }

    #[test]
    fn test_unhealthy_excluded() {
        let lb = RoundRobin::new();
        let healthy = origin(8080);
        let sick = origin(8081);
        sick.record_failure(1);
        let origins = vec![healthy.clone(), sick];

        for _ in 0..10 {
            let chosen = lb.select(&origins, &[]).unwrap();
            assert_eq!(chosen.addr, healthy.addr);
        }
    }

    #[test]
    fn test_all_unhealthy_yields_none() {
        let lb = RoundRobin::new();
        let origins = vec![origin(8080), origin(8081)];
        for o in &origins {
            o.record_failure(1);
        }
        assert!(lb.select(&origins, &[]).is_none());
    }

    #[test]
    fn test_tried_origins_skipped() {
        let lb = RoundRobin::new();
        let origins = vec![origin(8080), origin(8081)];

        let chosen = lb.select(&origins, &[origins[0].addr]).unwrap();
        assert_eq!(chosen.addr, origins[1].addr);
    }

    #[test]
    fn test_tried_origin_revisited_when_only_candidate() {
        let lb = RoundRobin::new();
        let origins = vec![origin(8080)];

        let chosen = lb.select(&origins, &[origins[0].addr]).unwrap();
        assert_eq!(chosen.addr, origins[0].addr);
    }

    #[test]
    fn test_empty_group_yields_none() {
        let lb = RoundRobin::new();
        assert!(lb.select(&[], &[]).is_none());
    }
}

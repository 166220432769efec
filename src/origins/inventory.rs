//! Origin inventory: the authoritative origin set per group.
//!
//! # Responsibilities
//! - Own the one Origin instance per configured origin
//! - Apply passive health signals and emit transition events
//! - Select origins per group through the group's load balancer

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::schema::OriginConfig;
use crate::config::validation::ValidationError;
use crate::errors::ProxyError;
use crate::events::{EventSink, ProxyEvent};
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::LoadBalancer;
use crate::origins::origin::Origin;

struct GroupState {
    origins: Vec<Arc<Origin>>,
    balancer: RoundRobin,
}

/// The live origin set, grouped by routing destination.
pub struct OriginInventory {
    groups: HashMap<String, GroupState>,
    unhealthy_threshold: u32,
    events: EventSink,
}

impl OriginInventory {
    pub fn from_config(
        configs: &[OriginConfig],
        unhealthy_threshold: u32,
        events: EventSink,
    ) -> Result<Self, ValidationError> {
        let mut groups: HashMap<String, GroupState> = HashMap::new();
        for config in configs {
            let addr: SocketAddr = config.address.parse().map_err(|_| ValidationError {
                field: format!("origins.{}.address", config.name),
                message: format!("'{}' is not a valid socket address", config.address),
            })?;
            let origin = Arc::new(Origin::new(
                config.name.clone(),
                config.group.clone(),
                addr,
            ));
            groups
                .entry(config.group.clone())
                .or_insert_with(|| GroupState {
                    origins: Vec::new(),
                    balancer: RoundRobin::new(),
                })
                .origins
                .push(origin);
        }
        Ok(Self {
            groups,
            unhealthy_threshold,
            events,
        })
    }

    /// Select an available origin from a group, preferring origins not in
    /// `tried`. Zero candidates is a NoOriginsAvailable failure.
    pub fn select(&self, group: &str, tried: &[SocketAddr]) -> Result<Arc<Origin>, ProxyError> {
        let state = self
            .groups
            .get(group)
            .ok_or_else(|| ProxyError::NoOriginsAvailable {
                group: group.to_string(),
            })?;
        state
            .balancer
            .select(&state.origins, tried)
            .ok_or_else(|| ProxyError::NoOriginsAvailable {
                group: group.to_string(),
            })
    }

    /// Passive signal: an attempt against this origin succeeded.
    pub fn record_success(&self, origin: &Origin) {
        if let Some((from, to)) = origin.record_success() {
            tracing::info!(origin = %origin.name, from = from.as_str(), to = to.as_str(), "origin recovered");
            self.events.emit(ProxyEvent::OriginHealthChanged {
                origin: origin.name.clone(),
                from,
                to,
            });
        }
    }

    /// Passive signal: an attempt against this origin failed at the
    /// connection level.
    pub fn record_failure(&self, origin: &Origin) {
        if let Some((from, to)) = origin.record_failure(self.unhealthy_threshold) {
            tracing::warn!(origin = %origin.name, from = from.as_str(), to = to.as_str(), "origin marked unhealthy");
            self.events.emit(ProxyEvent::OriginHealthChanged {
                origin: origin.name.clone(),
                from,
                to,
            });
        }
    }

    /// Every configured origin, for the active prober.
    pub fn all_origins(&self) -> Vec<Arc<Origin>> {
        self.groups
            .values()
            .flat_map(|state| state.origins.iter())
            .cloned()
            .collect()
    }

    pub fn group_size(&self, group: &str) -> usize {
        self.groups.get(group).map(|s| s.origins.len()).unwrap_or(0)
    }
}

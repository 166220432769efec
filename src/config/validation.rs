//! Semantic configuration checks.
//!
//! Serde guarantees shape; this pass guarantees meaning: addresses parse,
//! limits are internally consistent, and every route points at a group
//! that actually has members.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting all failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.max_per_origin == 0 {
        errors.push(ValidationError {
            field: "pool.max_per_origin".into(),
            message: "must be at least 1".into(),
        });
    }
    if config.pool.max_idle > config.pool.max_per_origin {
        errors.push(ValidationError {
            field: "pool.max_idle".into(),
            message: "must not exceed pool.max_per_origin".into(),
        });
    }
    if config.health_check.unhealthy_threshold == 0 {
        errors.push(ValidationError {
            field: "health_check.unhealthy_threshold".into(),
            message: "must be at least 1".into(),
        });
    }

    let mut groups: HashSet<&str> = HashSet::new();
    let mut names: HashSet<&str> = HashSet::new();
    for origin in &config.origins {
        groups.insert(origin.group.as_str());
        if !names.insert(origin.name.as_str()) {
            errors.push(ValidationError {
                field: format!("origins.{}", origin.name),
                message: "duplicate origin name".into(),
            });
        }
        if origin.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: format!("origins.{}.address", origin.name),
                message: format!("'{}' is not a valid socket address", origin.address),
            });
        }
    }

    for route in &config.routes {
        if !groups.contains(route.origin_group.as_str()) {
            errors.push(ValidationError {
                field: format!("routes.{}.origin_group", route.name),
                message: format!("group '{}' has no origins", route.origin_group),
            });
        }
    }
    if let Some(default) = &config.default_group {
        if !groups.contains(default.as_str()) {
            errors.push(ValidationError {
                field: "default_group".into(),
                message: format!("group '{}' has no origins", default),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OriginConfig, RouteConfig};

    fn base_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.origins.push(OriginConfig {
            name: "o1".into(),
            group: "web".into(),
            address: "127.0.0.1:3000".into(),
        });
        config.routes.push(RouteConfig {
            name: "r1".into(),
            host: None,
            path_prefix: Some("/".into()),
            headers: Default::default(),
            origin_group: "web".into(),
            priority: 0,
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_bad_address_rejected() {
        let mut config = base_config();
        config.origins[0].address = "not-an-address".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field.contains("address")));
    }

    #[test]
    fn test_dangling_group_rejected() {
        let mut config = base_config();
        config.routes[0].origin_group = "missing".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_idle_cap_must_fit() {
        let mut config = base_config();
        config.pool.max_idle = config.pool.max_per_origin + 1;
        assert!(validate_config(&config).is_err());
    }
}

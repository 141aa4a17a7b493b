//! Static service discovery with environment variable configuration.
//!
//! Nodes are registered at startup and handed out round-robin per service.
//!
//! # Environment Variable Configuration
//!
//! ```bash
//! # SERVICE_NODES_{SERVICE NAME IN UPPER SNAKE CASE}=host:port[,host:port...]
//! SERVICE_NODES_DMS_SMS_V1_SERVICE_STUDENT=10.0.0.11:8080,10.0.0.12:8080
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::error::RemoteError;

/// Environment variable prefix for service node lists.
pub const NODES_PREFIX: &str = "SERVICE_NODES_";

/// One addressable instance of a remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceNode {
    pub host: String,
    pub port: u16,
}

impl ServiceNode {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{self}")
    }
}

impl fmt::Display for ServiceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServiceNode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| format!("'{s}' is not host:port"))?;
        if host.is_empty() {
            return Err(format!("'{s}' has an empty host"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("'{s}' has an invalid port"))?;
        Ok(Self::new(host, port))
    }
}

struct NodeRing {
    nodes: Vec<ServiceNode>,
    next: AtomicUsize,
}

/// Round-robin discovery over a fixed node list per service.
#[derive(Default)]
pub struct StaticDiscovery {
    services: HashMap<String, NodeRing>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the process environment for `SERVICE_NODES_*` variables.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from `(key, value)` pairs shaped like environment variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut discovery = Self::new();

        for (key, value) in vars {
            let Some(service_key) = key.strip_prefix(NODES_PREFIX) else {
                continue;
            };
            let mut nodes = Vec::new();
            for entry in value.split(',').filter(|e| !e.trim().is_empty()) {
                match entry.parse::<ServiceNode>() {
                    Ok(node) => nodes.push(node),
                    Err(reason) => warn!(key = %key, %reason, "Skipping malformed service node"),
                }
            }
            discovery.insert(service_key.to_string(), nodes);
        }

        info!(
            services = discovery.services.len(),
            "Static discovery initialized from environment"
        );
        discovery
    }

    /// Register the nodes of `service`, replacing any previous list.
    pub fn register(&mut self, service: &str, nodes: Vec<ServiceNode>) {
        self.insert(env_key(service), nodes);
    }

    fn insert(&mut self, key: String, nodes: Vec<ServiceNode>) {
        self.services.insert(
            key,
            NodeRing {
                nodes,
                next: AtomicUsize::new(0),
            },
        );
    }

    /// Next node of `service` in round-robin order.
    pub fn next_node(&self, service: &str) -> Result<ServiceNode, RemoteError> {
        let ring = self
            .services
            .get(&env_key(service))
            .filter(|ring| !ring.nodes.is_empty())
            .ok_or_else(|| {
                RemoteError::Unavailable(format!("no node registered for {service}"))
            })?;

        let index = ring.next.fetch_add(1, Ordering::Relaxed) % ring.nodes.len();
        let node = ring.nodes[index].clone();
        debug!(service, node = %node, "Resolved service node");
        Ok(node)
    }
}

/// `DMS.SMS.v1.service.student` -> `DMS_SMS_V1_SERVICE_STUDENT`.
pub fn env_key(service: &str) -> String {
    service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const STUDENT_SERVICE: &str = "DMS.SMS.v1.service.student";

    #[test]
    fn service_name_maps_to_env_key() {
        assert_eq!(env_key(STUDENT_SERVICE), "DMS_SMS_V1_SERVICE_STUDENT");
    }

    #[test]
    fn nodes_are_handed_out_round_robin() {
        let discovery = StaticDiscovery::from_vars([(
            "SERVICE_NODES_DMS_SMS_V1_SERVICE_STUDENT".to_string(),
            "10.0.0.1:80, 10.0.0.2:81".to_string(),
        )]);

        let picks: Vec<String> = (0..4)
            .map(|_| discovery.next_node(STUDENT_SERVICE).unwrap().to_string())
            .collect();
        assert_eq!(
            picks,
            ["10.0.0.1:80", "10.0.0.2:81", "10.0.0.1:80", "10.0.0.2:81"]
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let discovery = StaticDiscovery::from_vars([
            (
                "SERVICE_NODES_DMS_SMS_V1_SERVICE_STUDENT".to_string(),
                "nohost,:80,10.0.0.1:99999,10.0.0.3:8080".to_string(),
            ),
            ("UNRELATED".to_string(), "1.1.1.1:1".to_string()),
        ]);

        assert_eq!(
            discovery.next_node(STUDENT_SERVICE).unwrap(),
            ServiceNode::new("10.0.0.3", 8080)
        );
    }

    #[test]
    fn unknown_service_is_unavailable() {
        let mut discovery = StaticDiscovery::new();
        discovery.register("empty.service", Vec::new());

        assert_matches!(
            discovery.next_node("missing.service"),
            Err(RemoteError::Unavailable(_))
        );
        assert_matches!(
            discovery.next_node("empty.service"),
            Err(RemoteError::Unavailable(_))
        );
    }
}

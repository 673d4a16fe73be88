use std::collections::HashSet;

use regex_lite::Regex;

use crate::error::ProvisionError;
use crate::models::port_names::{MANAGEMENT_PREFIX, RESERVED_PORT};
use crate::models::Edge;

const CANONICAL_PORT: &str = r"(?i)^ethernet(\d+)";

/// Turn raw adjacency observations into an undirected edge list between
/// managed devices.
///
/// Edges touching an identity outside `known` are dropped, a reverse
/// duplicate of an already accepted edge is dropped, and management ports
/// are renamed to the reserved extra port. First-seen order is kept.
pub fn canonicalize(edges: Vec<Edge>, known: &HashSet<String>) -> Vec<Edge> {
    let mut accepted: Vec<Edge> = Vec::new();

    for edge in edges {
        if !known.contains(&edge.switch_a) || !known.contains(&edge.switch_b) {
            tracing::debug!("Dropping adjacency outside the fleet: {}", edge);
            continue;
        }
        if accepted.iter().any(|seen| seen.is_reverse_of(&edge)) {
            continue;
        }
        accepted.push(edge);
    }

    accepted
        .into_iter()
        .map(|edge| Edge {
            port_a: normalize_port(&edge.port_a),
            port_b: normalize_port(&edge.port_b),
            ..edge
        })
        .collect()
}

/// Rename a management port to the reserved extra port
pub fn normalize_port(port: &str) -> String {
    if port.to_lowercase().starts_with(MANAGEMENT_PREFIX) {
        RESERVED_PORT.to_string()
    } else {
        port.to_string()
    }
}

/// Lab adapter index for a canonical port name: `ethernet<N>[/<M>]` -> N.
/// The breakout suffix is discarded.
pub fn adapter_index(port: &str) -> Result<u32, ProvisionError> {
    let invalid = || ProvisionError::InvalidPortFormat {
        port: port.to_string(),
    };

    let re = Regex::new(CANONICAL_PORT).map_err(|_| invalid())?;
    let caps = re.captures(port).ok_or_else(invalid)?;
    caps.get(1)
        .and_then(|n| n.as_str().parse::<u32>().ok())
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reverse_duplicate_dropped() {
        let edges = vec![
            Edge::new("A", "Ethernet1", "B", "Ethernet2"),
            Edge::new("B", "Ethernet2", "A", "Ethernet1"),
        ];
        let out = canonicalize(edges, &known(&["A", "B"]));
        assert_eq!(out, vec![Edge::new("A", "Ethernet1", "B", "Ethernet2")]);
    }

    #[test]
    fn test_parallel_links_kept() {
        let edges = vec![
            Edge::new("A", "Ethernet1", "B", "Ethernet1"),
            Edge::new("A", "Ethernet2", "B", "Ethernet2"),
            Edge::new("B", "Ethernet2", "A", "Ethernet2"),
            Edge::new("B", "Ethernet1", "A", "Ethernet1"),
        ];
        let out = canonicalize(edges, &known(&["A", "B"]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].port_a, "Ethernet1");
        assert_eq!(out[1].port_a, "Ethernet2");
    }

    #[test]
    fn test_unknown_endpoints_filtered() {
        let edges = vec![
            Edge::new("A", "Ethernet1", "B", "Ethernet1"),
            Edge::new("A", "Ethernet2", "core-router", "xe-0/0/1"),
            Edge::new("phone-7", "port1", "B", "Ethernet9"),
        ];
        let ids = known(&["A", "B"]);
        let out = canonicalize(edges.clone(), &ids);

        assert_eq!(out.len(), 1);
        assert!(out.len() <= edges.len());
        assert!(out.iter().all(|e| ids.contains(&e.switch_a) && ids.contains(&e.switch_b)));
        for (i, e) in out.iter().enumerate() {
            assert!(out[i + 1..].iter().all(|o| !o.is_reverse_of(e)));
        }
    }

    #[test]
    fn test_management_ports_normalized() {
        let edges = vec![
            Edge::new("A", "Management1", "B", "Ethernet5"),
            Edge::new("C", "Ethernet7", "A", "management0"),
        ];
        let out = canonicalize(edges, &known(&["A", "B", "C"]));
        assert_eq!(out[0].port_a, "ethernet0");
        assert_eq!(out[0].port_b, "Ethernet5");
        assert_eq!(out[1].port_b, "ethernet0");
    }

    #[test]
    fn test_management_breakout_maps_to_reserved_adapter() {
        let port = normalize_port("Management1/1");
        assert_eq!(port, "ethernet0");
        assert_eq!(adapter_index(&port), Ok(0));
    }

    #[test]
    fn test_adapter_index() {
        assert_eq!(adapter_index("Ethernet12"), Ok(12));
        assert_eq!(adapter_index("ethernet3/1"), Ok(3));
        assert_eq!(adapter_index("Ethernet49/4"), Ok(49));
        assert!(matches!(
            adapter_index("Port-Channel1"),
            Err(ProvisionError::InvalidPortFormat { .. })
        ));
        assert!(adapter_index("Ethernet").is_err());
        assert!(adapter_index("").is_err());
    }
}

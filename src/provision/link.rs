use std::collections::HashMap;

use crate::error::ProvisionError;
use crate::gns3::LabApi;
use crate::models::{Edge, LinkEndpoint};
use crate::topology::adapter_index;

use super::ProvisionSettings;

/// Single link per adapter pair, always on port slot 0
const LINK_PORT: u32 = 0;

/// Wires canonical edges between nodes created in Phase 1
pub struct LinkProvisioner<'a> {
    lab: &'a dyn LabApi,
    settings: &'a ProvisionSettings,
    project_id: &'a str,
}

impl<'a> LinkProvisioner<'a> {
    pub fn new(lab: &'a dyn LabApi, settings: &'a ProvisionSettings, project_id: &'a str) -> Self {
        Self {
            lab,
            settings,
            project_id,
        }
    }

    /// Create a link between two node adapters
    pub async fn create_link(
        &self,
        node_a: &str,
        adapter_a: u32,
        node_b: &str,
        adapter_b: u32,
    ) -> Result<String, ProvisionError> {
        let a = LinkEndpoint {
            node_id: node_a.to_string(),
            adapter_number: adapter_a,
            port_number: LINK_PORT,
        };
        let b = LinkEndpoint {
            node_id: node_b.to_string(),
            adapter_number: adapter_b,
            port_number: LINK_PORT,
        };
        let link_id = self.lab.create_link(self.project_id, &a, &b).await?;
        self.settings.pace().await;
        Ok(link_id)
    }

    /// Resolve an edge against the identity -> node id map and link it
    pub async fn link_edge(&self, edge: &Edge, nodes: &HashMap<String, String>) -> Result<String, ProvisionError> {
        let node_a = resolve(nodes, &edge.switch_a)?;
        let node_b = resolve(nodes, &edge.switch_b)?;
        let adapter_a = adapter_index(&edge.port_a)?;
        let adapter_b = adapter_index(&edge.port_b)?;

        let link_id = self.create_link(node_a, adapter_a, node_b, adapter_b).await?;
        tracing::info!("Linked {} as {}", edge, link_id);
        Ok(link_id)
    }
}

fn resolve<'n>(nodes: &'n HashMap<String, String>, identity: &str) -> Result<&'n str, ProvisionError> {
    nodes
        .get(identity)
        .map(String::as_str)
        .ok_or_else(|| ProvisionError::UnprovisionedEndpoint {
            identity: identity.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::mock::MockLab;

    fn nodes() -> HashMap<String, String> {
        HashMap::from([
            ("spine1".to_string(), "node-a".to_string()),
            ("leaf1".to_string(), "node-b".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_link_edge_parses_adapters() {
        let lab = MockLab::default();
        let settings = ProvisionSettings::immediate();
        let links = LinkProvisioner::new(&lab, &settings, "p1");

        let edge = Edge::new("spine1", "Ethernet3/1", "leaf1", "ethernet0");
        tokio_test::assert_ok!(links.link_edge(&edge, &nodes()).await);

        let created = lab.links();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0.node_id, "node-a");
        assert_eq!(created[0].0.adapter_number, 3);
        assert_eq!(created[0].1.node_id, "node-b");
        assert_eq!(created[0].1.adapter_number, 0);
        assert_eq!(created[0].1.port_number, 0);
    }

    #[tokio::test]
    async fn test_invalid_port_skips_link() {
        let lab = MockLab::default();
        let settings = ProvisionSettings::immediate();
        let links = LinkProvisioner::new(&lab, &settings, "p1");

        let edge = Edge::new("spine1", "Port-Channel10", "leaf1", "Ethernet1");
        let err = tokio_test::assert_err!(links.link_edge(&edge, &nodes()).await);
        assert!(matches!(err, ProvisionError::InvalidPortFormat { .. }));
        assert!(lab.links().is_empty());
    }

    #[tokio::test]
    async fn test_missing_node() {
        let lab = MockLab::default();
        let settings = ProvisionSettings::immediate();
        let links = LinkProvisioner::new(&lab, &settings, "p1");

        let edge = Edge::new("spine1", "Ethernet1", "leaf9", "Ethernet1");
        let err = tokio_test::assert_err!(links.link_edge(&edge, &nodes()).await);
        assert_eq!(
            err,
            ProvisionError::UnprovisionedEndpoint { identity: "leaf9".into() }
        );
    }
}

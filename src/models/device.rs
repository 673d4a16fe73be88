use serde::{Deserialize, Serialize};

/// Hardware facts reported by a switch, immutable once collected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareFacts {
    pub model: String,
    pub os_version: String,
    pub system_mac: String,
    pub serial_number: String,
}

/// RawDevice is a switch as collected, before any rewriting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDevice {
    /// Address used to reach the switch
    pub name: String,
    /// Identity in the adjacency graph, may differ from `name`
    pub lldp_system_name: String,
    pub facts: HardwareFacts,
    pub config: Vec<String>,
}

/// SanitizedDevice carries a container-safe configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedDevice {
    pub name: String,
    pub lldp_system_name: String,
    pub facts: HardwareFacts,
    pub ethernet_interface_count: usize,
    pub config: Vec<String>,
}

impl SanitizedDevice {
    /// Adapters the lab node needs: one per Ethernet interface plus the
    /// management-class adapter 0
    pub fn adapter_count(&self) -> usize {
        self.ethernet_interface_count + 1
    }
}

/// ProvisionedDevice is a device whose lab node exists (end of Phase 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedDevice {
    pub name: String,
    pub lldp_system_name: String,
    /// Source template the temporary clone was made from
    pub template_id: String,
    pub node_id: String,
    pub container_id: String,
}

/// ConfiguredDevice is a node whose container holds the startup config
/// and has been stopped again (end of Phase 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfiguredDevice {
    pub name: String,
    pub node_id: String,
    pub container_id: String,
}

/// Progress of one device through provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Pending,
    TemplateCloned,
    AdaptersConfigured,
    NodeInstantiated,
    TemplateDeleted,
    Named,
    ContainerIdResolved,
    ContainerStarted,
    ContainerReady,
    ConfigArchiveBuilt,
    ConfigCopied,
    ConfigMoved,
    ContainerStopped,
    Done,
    Failed(String),
}

/// Inventory is everything collected from the fleet for one run
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub devices: Vec<RawDevice>,
    /// Adjacency observations from every device, as reported
    pub adjacencies: Vec<super::Edge>,
    /// Hosts that could not be collected
    pub failures: Vec<super::FailureRecord>,
}

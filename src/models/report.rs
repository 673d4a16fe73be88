use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ConfiguredDevice, DeviceState, Edge, ProvisionedDevice};
use crate::error::ProvisionError;

/// Failure taxonomy as it appears in the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedConfig,
    InvalidPortFormat,
    ProvisioningTimeout,
    ExternalApiError,
    CleanupFailure,
    MissingTemplate,
    UnprovisionedEndpoint,
}

/// Pipeline stage an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Collect,
    Sanitize,
    CreateNodes,
    ConfigureContainers,
    CreateLinks,
    Cleanup,
}

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
}

/// FailureRecord names one failed item and why
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    /// Device name or edge description
    pub subject: String,
    pub phase: Phase,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    pub fn new(subject: impl Into<String>, phase: Phase, err: &ProvisionError) -> Self {
        Self {
            subject: subject.into(),
            phase,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Per-device outcome across all phases
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub configured: bool,
    /// Last state reached
    pub state: DeviceState,
}

impl DeviceReport {
    pub fn from_phases(
        name: &str,
        state: DeviceState,
        provisioned: Option<&ProvisionedDevice>,
        configured: Option<&ConfiguredDevice>,
    ) -> Self {
        Self {
            name: name.to_string(),
            node_id: provisioned.map(|p| p.node_id.clone()),
            container_id: provisioned.map(|p| p.container_id.clone()),
            configured: configured.is_some(),
            state,
        }
    }

    /// A device dropped before any lab call was made for it
    pub fn skipped(failure: &FailureRecord) -> Self {
        Self {
            name: failure.subject.clone(),
            node_id: None,
            container_id: None,
            configured: false,
            state: DeviceState::Failed(failure.message.clone()),
        }
    }
}

/// Per-edge outcome
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub edge: Edge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
}

/// RunReport is the result of one replication run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub project_name: String,
    pub project_id: String,
    pub project_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub devices: Vec<DeviceReport>,
    pub links: Vec<LinkReport>,
    pub failures: Vec<FailureRecord>,
    /// Cleanup problems; reported but never change `status`
    pub warnings: Vec<FailureRecord>,
}

impl RunReport {
    /// Status implied by a failure list
    pub fn status_for(failures: &[FailureRecord]) -> RunStatus {
        if failures.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }

    pub fn failures_for(&self, subject: &str) -> Vec<&FailureRecord> {
        self.failures.iter().filter(|f| f.subject == subject).collect()
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use crate::docker::ContainerRuntime;
use crate::error::ProvisionError;
use crate::gns3::templates::image_key;
use crate::gns3::{LabApi, TemplateIndex};
use crate::models::*;
use crate::sanitizer::sanitize;
use crate::topology::canonicalize;

use super::{canvas_position, DeviceProvisioner, LinkProvisioner, ProvisionSettings};

/// Runs a whole replication: sanitize, create nodes, then configure
/// containers and wire links. One item's failure never stops its siblings.
pub struct ReplicationOrchestrator {
    lab: Arc<dyn LabApi>,
    runtime: Arc<dyn ContainerRuntime>,
    settings: ProvisionSettings,
}

impl ReplicationOrchestrator {
    pub fn new(lab: Arc<dyn LabApi>, runtime: Arc<dyn ContainerRuntime>, settings: ProvisionSettings) -> Self {
        Self { lab, runtime, settings }
    }

    /// Provision a fresh lab project mirroring `inventory`.
    ///
    /// Only failing to create the project itself is an error; every other
    /// failure is recorded in the returned report.
    pub async fn run(&self, project_name: &str, inventory: Inventory) -> Result<RunReport, ProvisionError> {
        let started_at = Utc::now();
        let mut failures = inventory.failures;

        let known: HashSet<String> = inventory
            .devices
            .iter()
            .map(|d| d.lldp_system_name.clone())
            .collect();
        let observed = inventory.adjacencies.len();
        let edges = canonicalize(inventory.adjacencies, &known);
        tracing::info!("{} adjacency observations -> {} links", observed, edges.len());

        // Devices that never reach the lab still get a report entry
        let mut skipped: Vec<DeviceReport> = failures
            .iter()
            .filter(|f| f.phase == Phase::Collect)
            .map(DeviceReport::skipped)
            .collect();

        let mut devices = Vec::with_capacity(inventory.devices.len());
        for raw in inventory.devices {
            let name = raw.name.clone();
            match sanitize(raw) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    record(&mut failures, &name, Phase::Sanitize, &e);
                    skipped.extend(failures.last().map(DeviceReport::skipped));
                }
            }
        }

        let project_id = self.lab.create_project(project_name).await?;
        let project_url = self.lab.project_url(&project_id);
        tracing::info!("Created lab project '{}' ({})", project_name, project_id);

        let templates = self.lab.list_templates().await.map(TemplateIndex::new);
        match &templates {
            Ok(index) => tracing::info!("Found {} container templates", index.len()),
            Err(e) => tracing::error!("Failed to list lab templates: {}", e),
        }

        // Phase 1: every device's node, then a barrier
        let provisioner = DeviceProvisioner::new(&*self.lab, &*self.runtime, &self.settings, &project_id);
        let provisioner = &provisioner;
        let templates = &templates;
        tracing::info!("Creating {} nodes", devices.len());
        let created = join_all(
            devices
                .iter()
                .enumerate()
                .map(|(index, device)| create_node(provisioner, templates, index, device)),
        )
        .await;

        let mut provisioned: Vec<Option<ProvisionedDevice>> = Vec::with_capacity(devices.len());
        for (device, result) in devices.iter().zip(created) {
            match result {
                Ok(node) => provisioned.push(Some(node)),
                Err(e) => {
                    record(&mut failures, &device.name, Phase::CreateNodes, &e);
                    provisioned.push(None);
                }
            }
        }

        let nodes: HashMap<String, String> = provisioned
            .iter()
            .flatten()
            .map(|p| (p.lldp_system_name.clone(), p.node_id.clone()))
            .collect();

        // Phases 2 and 3 only need Phase 1 results, so they overlap
        tracing::info!("Configuring {} containers and {} links", nodes.len(), edges.len());
        let configure = join_all(devices.iter().zip(&provisioned).map(|(device, node)| async move {
            match node {
                Some(node) => Some(provisioner.configure_container(device, node).await),
                None => None,
            }
        }));

        let linker = LinkProvisioner::new(&*self.lab, &self.settings, &project_id);
        let wire = join_all(edges.iter().map(|edge| linker.link_edge(edge, &nodes)));

        let (configured, linked) = tokio::join!(configure, wire);

        let mut device_reports = Vec::with_capacity(devices.len());
        for ((device, node), outcome) in devices.iter().zip(&provisioned).zip(configured) {
            let done = match outcome {
                Some(Ok(done)) => Some(done),
                Some(Err(e)) => {
                    record(&mut failures, &device.name, Phase::ConfigureContainers, &e);
                    None
                }
                None => None,
            };
            let state = provisioner.state_of(&device.name).unwrap_or(DeviceState::Pending);
            device_reports.push(DeviceReport::from_phases(&device.name, state, node.as_ref(), done.as_ref()));
        }
        device_reports.extend(skipped);

        let mut links = Vec::with_capacity(edges.len());
        for (edge, outcome) in edges.into_iter().zip(linked) {
            let link_id = match outcome {
                Ok(id) => Some(id),
                Err(e) => {
                    record(&mut failures, &edge.to_string(), Phase::CreateLinks, &e);
                    None
                }
            };
            links.push(LinkReport { edge, link_id });
        }

        let mut warnings = provisioner.take_warnings();
        if let Err(e) = self.lab.close_project(&project_id).await {
            let cleanup = ProvisionError::Cleanup(format!("closing project {}: {}", project_id, e));
            tracing::warn!("{}", cleanup);
            warnings.push(FailureRecord::new(project_name, Phase::Cleanup, &cleanup));
        }

        let status = RunReport::status_for(&failures);
        tracing::info!("Replication finished: {:?}, {} failures", status, failures.len());

        Ok(RunReport {
            project_name: project_name.to_string(),
            project_id,
            project_url,
            started_at,
            finished_at: Utc::now(),
            status,
            devices: device_reports,
            links,
            failures,
            warnings,
        })
    }
}

async fn create_node(
    provisioner: &DeviceProvisioner<'_>,
    templates: &Result<TemplateIndex, ProvisionError>,
    index: usize,
    device: &SanitizedDevice,
) -> Result<ProvisionedDevice, ProvisionError> {
    let template_id = match resolve_template(templates, device) {
        Ok(id) => id,
        Err(e) => return Err(provisioner.mark_failed(&device.name, e)),
    };
    provisioner
        .create_node(device, template_id, canvas_position(index))
        .await
}

fn resolve_template<'t>(
    templates: &'t Result<TemplateIndex, ProvisionError>,
    device: &SanitizedDevice,
) -> Result<&'t str, ProvisionError> {
    let catalog = templates.as_ref().map_err(|e| e.clone())?;
    catalog
        .lookup(&device.facts.os_version)
        .ok_or_else(|| ProvisionError::MissingTemplate {
            image: image_key(&device.facts.os_version),
        })
}

fn record(failures: &mut Vec<FailureRecord>, subject: &str, phase: Phase, err: &ProvisionError) {
    tracing::warn!("{} failed during {:?}: {}", subject, phase, err);
    failures.push(FailureRecord::new(subject, phase, err));
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::docker::{config_archive, ContainerRuntime, MOVE_CONFIG_CMD};
use crate::error::ProvisionError;
use crate::gns3::LabApi;
use crate::models::{
    CanvasPosition, ConfiguredDevice, DeviceState, FailureRecord, Phase, ProvisionedDevice, SanitizedDevice,
};

use super::ProvisionSettings;

/// Drives one device from a template to a configured, stopped lab node.
/// Steps are strictly sequential for a device; separate devices share
/// only the API clients.
pub struct DeviceProvisioner<'a> {
    lab: &'a dyn LabApi,
    runtime: &'a dyn ContainerRuntime,
    settings: &'a ProvisionSettings,
    project_id: &'a str,
    states: Mutex<HashMap<String, DeviceState>>,
    warnings: Mutex<Vec<FailureRecord>>,
}

impl<'a> DeviceProvisioner<'a> {
    pub fn new(
        lab: &'a dyn LabApi,
        runtime: &'a dyn ContainerRuntime,
        settings: &'a ProvisionSettings,
        project_id: &'a str,
    ) -> Self {
        Self {
            lab,
            runtime,
            settings,
            project_id,
            states: Mutex::new(HashMap::new()),
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Last state a device reached
    pub fn state_of(&self, device: &str) -> Option<DeviceState> {
        self.states.lock().ok()?.get(device).cloned()
    }

    /// Cleanup failures seen so far, draining them
    pub fn take_warnings(&self) -> Vec<FailureRecord> {
        self.warnings
            .lock()
            .map(|mut warnings| std::mem::take(&mut *warnings))
            .unwrap_or_default()
    }

    fn advance(&self, device: &str, state: DeviceState) {
        tracing::debug!("{}: {:?}", device, state);
        if let Ok(mut states) = self.states.lock() {
            states.insert(device.to_string(), state);
        }
    }

    /// Record a device as failed, passing the error through
    pub fn mark_failed(&self, device: &str, err: ProvisionError) -> ProvisionError {
        self.advance(device, DeviceState::Failed(err.to_string()));
        err
    }

    fn cleanup_failed(&self, device: &str, err: ProvisionError) {
        tracing::warn!("{}: {}", device, err);
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(FailureRecord::new(device, Phase::Cleanup, &err));
        }
    }

    /// Phase 1: materialise the lab node and resolve its container
    pub async fn create_node(
        &self,
        device: &SanitizedDevice,
        template_id: &str,
        position: CanvasPosition,
    ) -> Result<ProvisionedDevice, ProvisionError> {
        self.create_node_steps(device, template_id, position)
            .await
            .map_err(|e| self.mark_failed(&device.name, e))
    }

    async fn create_node_steps(
        &self,
        device: &SanitizedDevice,
        template_id: &str,
        position: CanvasPosition,
    ) -> Result<ProvisionedDevice, ProvisionError> {
        let name = device.name.as_str();
        self.advance(name, DeviceState::Pending);

        let temp_template = self.lab.clone_template(template_id).await?;
        self.settings.pace().await;
        self.advance(name, DeviceState::TemplateCloned);

        self.lab
            .set_template_adapters(&temp_template, device.adapter_count())
            .await?;
        self.settings.pace().await;
        self.advance(name, DeviceState::AdaptersConfigured);

        let node_id = self
            .lab
            .create_node_from_template(self.project_id, &temp_template, position)
            .await?;
        self.settings.pace().await;
        self.advance(name, DeviceState::NodeInstantiated);

        if let Err(e) = self.lab.delete_template(&temp_template).await {
            let cleanup = ProvisionError::Cleanup(format!("temporary template {}: {}", temp_template, e));
            self.cleanup_failed(name, cleanup);
        }
        self.settings.pace().await;
        self.advance(name, DeviceState::TemplateDeleted);

        self.lab.rename_node(self.project_id, &node_id, name).await?;
        self.settings.pace().await;
        self.advance(name, DeviceState::Named);

        let container_id = self.lab.node_container_id(self.project_id, &node_id).await?;
        self.settings.pace().await;
        self.advance(name, DeviceState::ContainerIdResolved);

        tracing::info!("Created node {} for {} (container {})", node_id, name, container_id);

        Ok(ProvisionedDevice {
            name: device.name.clone(),
            lldp_system_name: device.lldp_system_name.clone(),
            template_id: template_id.to_string(),
            node_id,
            container_id,
        })
    }

    /// Phase 2: push the startup config into the node's container and
    /// leave it stopped
    pub async fn configure_container(
        &self,
        device: &SanitizedDevice,
        node: &ProvisionedDevice,
    ) -> Result<ConfiguredDevice, ProvisionError> {
        self.configure_container_steps(device, node)
            .await
            .map_err(|e| self.mark_failed(&node.name, e))
    }

    async fn configure_container_steps(
        &self,
        device: &SanitizedDevice,
        node: &ProvisionedDevice,
    ) -> Result<ConfiguredDevice, ProvisionError> {
        let container_id = node.container_id.as_str();

        self.runtime.start(container_id).await?;
        self.advance(&node.name, DeviceState::ContainerStarted);

        if let Err(e) = self.seed_config(device, node).await {
            if let Err(stop_err) = self.runtime.stop(container_id).await {
                let cleanup = ProvisionError::Cleanup(format!("stopping {}: {}", container_id, stop_err));
                self.cleanup_failed(&node.name, cleanup);
            }
            return Err(e);
        }

        self.runtime.stop(container_id).await?;
        self.advance(&node.name, DeviceState::ContainerStopped);
        self.advance(&node.name, DeviceState::Done);

        tracing::info!("Pushed startup config to {} ({})", node.name, container_id);

        Ok(ConfiguredDevice {
            name: node.name.clone(),
            node_id: node.node_id.clone(),
            container_id: node.container_id.clone(),
        })
    }

    async fn seed_config(&self, device: &SanitizedDevice, node: &ProvisionedDevice) -> Result<(), ProvisionError> {
        let container_id = node.container_id.as_str();

        self.wait_until_running(container_id).await?;
        self.advance(&node.name, DeviceState::ContainerReady);

        let archive = config_archive(&device.config)
            .map_err(|e| ProvisionError::MalformedConfig(format!("archiving config: {}", e)))?;
        self.advance(&node.name, DeviceState::ConfigArchiveBuilt);

        self.runtime.put_archive(container_id, "/", archive).await?;
        self.advance(&node.name, DeviceState::ConfigCopied);

        let status = self.runtime.exec(container_id, MOVE_CONFIG_CMD).await?;
        if status != 0 {
            return Err(ProvisionError::container(format!(
                "'{}' exited with status {} in {}",
                MOVE_CONFIG_CMD.join(" "),
                status,
                container_id
            )));
        }
        self.advance(&node.name, DeviceState::ConfigMoved);

        Ok(())
    }

    async fn wait_until_running(&self, container_id: &str) -> Result<(), ProvisionError> {
        let timeout = self.settings.container_ready_timeout;
        let deadline = Instant::now() + timeout;

        while Instant::now() <= deadline {
            if self.runtime.is_running(container_id).await? {
                return Ok(());
            }
            tokio::time::sleep(self.settings.container_poll_interval).await;
        }

        Err(ProvisionError::ProvisioningTimeout {
            container_id: container_id.to_string(),
            waited_secs: timeout.as_secs(),
        })
    }
}

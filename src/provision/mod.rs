pub mod device;
pub mod layout;
pub mod link;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

pub use device::DeviceProvisioner;
pub use layout::canvas_position;
pub use link::LinkProvisioner;
pub use orchestrator::ReplicationOrchestrator;

/// Timing knobs for a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    /// Delay after each lab-management call, to avoid flooding the service
    pub lab_call_pacing: Duration,
    pub container_poll_interval: Duration,
    pub container_ready_timeout: Duration,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            lab_call_pacing: Duration::from_millis(200),
            container_poll_interval: Duration::from_secs(1),
            container_ready_timeout: Duration::from_secs(20),
        }
    }
}

impl ProvisionSettings {
    /// No pacing and a short readiness window, for tests
    #[cfg(test)]
    pub(crate) fn immediate() -> Self {
        Self {
            lab_call_pacing: Duration::ZERO,
            container_poll_interval: Duration::from_millis(1),
            container_ready_timeout: Duration::from_millis(50),
        }
    }

    pub(crate) async fn pace(&self) {
        if !self.lab_call_pacing.is_zero() {
            tokio::time::sleep(self.lab_call_pacing).await;
        }
    }
}

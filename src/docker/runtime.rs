use anyhow::Result;
use async_trait::async_trait;
use bollard::container::{StopContainerOptions, UploadToContainerOptions};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;

use super::ContainerRuntime;
use crate::error::ProvisionError;

/// Grace period before a stopping container is killed
const STOP_TIMEOUT_SECS: i64 = 5;

/// Docker answers 304 when a container is already in the requested state
const NOT_MODIFIED: u16 = 304;

/// Docker Engine API client for the lab server's container runtime
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect(server: &str, port: u16, timeout_secs: u64) -> Result<Self> {
        let addr = format!("http://{}:{}", server, port);
        let docker = Docker::connect_with_http(&addr, timeout_secs, bollard::API_DEFAULT_VERSION)
            .map_err(|e| anyhow::anyhow!("Docker not available at {}: {}", addr, e))?;
        Ok(Self { docker })
    }
}

fn already_in_state(e: &DockerError) -> bool {
    matches!(
        e,
        DockerError::DockerResponseServerError { status_code, .. } if *status_code == NOT_MODIFIED
    )
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn start(&self, container_id: &str) -> Result<(), ProvisionError> {
        match self.docker.start_container::<String>(container_id, None).await {
            Err(e) if !already_in_state(&e) => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn stop(&self, container_id: &str) -> Result<(), ProvisionError> {
        let options = StopContainerOptions { t: STOP_TIMEOUT_SECS };
        match self.docker.stop_container(container_id, Some(options)).await {
            Err(e) if !already_in_state(&e) => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn is_running(&self, container_id: &str) -> Result<bool, ProvisionError> {
        let inspect = self.docker.inspect_container(container_id, None).await?;
        Ok(inspect.state.and_then(|s| s.running).unwrap_or(false))
    }

    async fn put_archive(&self, container_id: &str, path: &str, archive: Vec<u8>) -> Result<(), ProvisionError> {
        let options = UploadToContainerOptions {
            path: path.to_string(),
            ..Default::default()
        };
        self.docker
            .upload_to_container(container_id, Some(options), archive.into())
            .await?;
        Ok(())
    }

    async fn exec(&self, container_id: &str, cmd: &[&str]) -> Result<i64, ProvisionError> {
        let exec_config = CreateExecOptions {
            cmd: Some(cmd.iter().map(|s| s.to_string()).collect::<Vec<String>>()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = self.docker.create_exec(container_id, exec_config).await?;

        let start_config = StartExecOptions { detach: false, ..Default::default() };
        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, Some(start_config)).await?
        {
            // Drain the stream so the command has finished before inspecting it
            while let Some(chunk) = output.next().await {
                tracing::debug!("exec {} on {}: {}", exec.id, container_id, chunk?);
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        inspect
            .exit_code
            .ok_or_else(|| ProvisionError::container(format!("exec {} reported no exit code", exec.id)))
    }
}

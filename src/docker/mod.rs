pub mod runtime;

use async_trait::async_trait;

use crate::error::ProvisionError;

pub use runtime::DockerRuntime;

/// Archive member name the container boots its configuration from
pub const STARTUP_CONFIG: &str = "startup-config";

/// Command relocating the uploaded config to persistent flash
pub const MOVE_CONFIG_CMD: &[&str] = &["mv", "/startup-config", "/mnt/flash/"];

/// Container-runtime operations used to seed a lab node's filesystem
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start a container; an already running container is not an error
    async fn start(&self, container_id: &str) -> Result<(), ProvisionError>;

    /// Stop a container; an already stopped container is not an error
    async fn stop(&self, container_id: &str) -> Result<(), ProvisionError>;

    async fn is_running(&self, container_id: &str) -> Result<bool, ProvisionError>;

    /// Extract a tar archive at `path` inside the container
    async fn put_archive(&self, container_id: &str, path: &str, archive: Vec<u8>) -> Result<(), ProvisionError>;

    /// Run a command to completion, returning its exit status
    async fn exec(&self, container_id: &str, cmd: &[&str]) -> Result<i64, ProvisionError>;
}

/// Build a tar archive in memory containing files
pub fn build_tar(files: &[(&str, &[u8], u32)]) -> std::io::Result<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());
    for &(filename, content, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(filename)?;
        header.set_size(content.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        archive.append(&header, content)?;
    }
    archive.finish()?;
    archive.into_inner()
}

/// Single-member archive holding a device's startup configuration
pub fn config_archive(config: &[String]) -> std::io::Result<Vec<u8>> {
    let mut content = config.join("\n");
    content.push('\n');
    build_tar(&[(STARTUP_CONFIG, content.as_bytes(), 0o644)])
}

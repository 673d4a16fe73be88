pub mod client;
pub mod templates;
pub mod types;

use async_trait::async_trait;

use crate::error::ProvisionError;
use crate::models::{CanvasPosition, LinkEndpoint};

pub use client::Gns3Client;
pub use templates::TemplateIndex;
pub use types::LabTemplate;

/// Lab-management service operations the pipeline consumes.
///
/// Create-type calls (project, template clone, node, link) must never be
/// retried blindly: a retry creates a duplicate resource.
#[async_trait]
pub trait LabApi: Send + Sync {
    async fn create_project(&self, name: &str) -> Result<String, ProvisionError>;

    async fn list_templates(&self) -> Result<Vec<LabTemplate>, ProvisionError>;

    /// Duplicate a template, returning the id of the copy
    async fn clone_template(&self, template_id: &str) -> Result<String, ProvisionError>;

    async fn set_template_adapters(&self, template_id: &str, adapters: usize) -> Result<(), ProvisionError>;

    /// Instantiate a node from a template, returning the node id
    async fn create_node_from_template(
        &self,
        project_id: &str,
        template_id: &str,
        position: CanvasPosition,
    ) -> Result<String, ProvisionError>;

    async fn delete_template(&self, template_id: &str) -> Result<(), ProvisionError>;

    async fn rename_node(&self, project_id: &str, node_id: &str, name: &str) -> Result<(), ProvisionError>;

    /// Identifier of the container backing a node
    async fn node_container_id(&self, project_id: &str, node_id: &str) -> Result<String, ProvisionError>;

    /// Link two node adapters, returning the link id
    async fn create_link(
        &self,
        project_id: &str,
        a: &LinkEndpoint,
        b: &LinkEndpoint,
    ) -> Result<String, ProvisionError>;

    async fn close_project(&self, project_id: &str) -> Result<(), ProvisionError>;

    /// Browser URL for a project
    fn project_url(&self, project_id: &str) -> String;
}

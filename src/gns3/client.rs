use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::*;
use super::LabApi;
use crate::error::ProvisionError;
use crate::models::{CanvasPosition, LinkEndpoint};

/// Attempts for calls that are safe to repeat (reads and deletes)
const IDEMPOTENT_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// GNS3 v2 REST client. One instance is shared by every concurrent task.
pub struct Gns3Client {
    base_url: String,
    auth: Option<(String, String)>,
    client: Client,
}

impl Gns3Client {
    pub fn new(server: &str, port: u16, auth: Option<(String, String)>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            base_url: format!("http://{}:{}", server, port),
            auth,
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v2{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.api_url(path));
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn check(resp: Response) -> Result<Response, ProvisionError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let path = resp.url().path().to_string();
        let body = resp.text().await.unwrap_or_default();
        Err(ProvisionError::lab(format!("{} {}: {}", status, path, body)))
    }

    /// Helper to perform a GET, retried on failure
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProvisionError> {
        let mut attempt = 1;
        loop {
            let result: Result<T, ProvisionError> = async {
                let resp = self.request(Method::GET, path).send().await?;
                Ok(Self::check(resp).await?.json::<T>().await?)
            }
            .await;

            match result {
                Err(e) if attempt < IDEMPOTENT_ATTEMPTS => {
                    tracing::debug!("GET {} failed (attempt {}): {}", path, attempt, e);
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                other => return other,
            }
        }
    }

    /// Helper to send a JSON body and decode the reply. Never retried.
    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ProvisionError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.request(method, path).json(body).send().await?;
        Ok(Self::check(resp).await?.json::<T>().await?)
    }

    /// Helper for calls whose reply body is not needed
    async fn send_unit<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ProvisionError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ProvisionError> {
        let mut attempt = 1;
        loop {
            match self.send_unit::<()>(Method::DELETE, path, None).await {
                Err(e) if attempt < IDEMPOTENT_ATTEMPTS => {
                    tracing::debug!("DELETE {} failed (attempt {}): {}", path, attempt, e);
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl LabApi for Gns3Client {
    async fn create_project(&self, name: &str) -> Result<String, ProvisionError> {
        let project: Project = self
            .send_json(Method::POST, "/projects", &ProjectCreate { name })
            .await?;
        Ok(project.project_id)
    }

    async fn list_templates(&self) -> Result<Vec<LabTemplate>, ProvisionError> {
        self.get_json("/templates").await
    }

    async fn clone_template(&self, template_id: &str) -> Result<String, ProvisionError> {
        let copy: TemplateRef = self
            .send_json(Method::POST, &format!("/templates/{}/duplicate", template_id), &serde_json::json!({}))
            .await?;
        Ok(copy.template_id)
    }

    async fn set_template_adapters(&self, template_id: &str, adapters: usize) -> Result<(), ProvisionError> {
        self.send_unit(
            Method::PUT,
            &format!("/templates/{}", template_id),
            Some(&AdaptersUpdate { adapters }),
        )
        .await
    }

    async fn create_node_from_template(
        &self,
        project_id: &str,
        template_id: &str,
        position: CanvasPosition,
    ) -> Result<String, ProvisionError> {
        let node: Node = self
            .send_json(
                Method::POST,
                &format!("/projects/{}/templates/{}", project_id, template_id),
                &NodeCreate { x: position.x, y: position.y },
            )
            .await?;
        Ok(node.node_id)
    }

    async fn delete_template(&self, template_id: &str) -> Result<(), ProvisionError> {
        self.delete(&format!("/templates/{}", template_id)).await
    }

    async fn rename_node(&self, project_id: &str, node_id: &str, name: &str) -> Result<(), ProvisionError> {
        self.send_unit(
            Method::PUT,
            &format!("/projects/{}/nodes/{}", project_id, node_id),
            Some(&NodeRename { name }),
        )
        .await
    }

    async fn node_container_id(&self, project_id: &str, node_id: &str) -> Result<String, ProvisionError> {
        let node: Node = self
            .get_json(&format!("/projects/{}/nodes/{}", project_id, node_id))
            .await?;
        node.properties
            .container_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProvisionError::lab(format!("node {} has no backing container", node.node_id)))
    }

    async fn create_link(
        &self,
        project_id: &str,
        a: &LinkEndpoint,
        b: &LinkEndpoint,
    ) -> Result<String, ProvisionError> {
        let link: Link = self
            .send_json(
                Method::POST,
                &format!("/projects/{}/links", project_id),
                &LinkCreate { nodes: [a, b] },
            )
            .await?;
        Ok(link.link_id)
    }

    async fn close_project(&self, project_id: &str) -> Result<(), ProvisionError> {
        self.send_unit::<()>(Method::POST, &format!("/projects/{}/close", project_id), None)
            .await
    }

    fn project_url(&self, project_id: &str) -> String {
        format!("{}/static/web-ui/server/1/project/{}", self.base_url, project_id)
    }
}

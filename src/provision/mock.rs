use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::docker::ContainerRuntime;
use crate::error::ProvisionError;
use crate::gns3::{LabApi, LabTemplate};
use crate::models::{CanvasPosition, LinkEndpoint};

/// A node as the mock lab sees it
#[derive(Debug, Clone)]
pub struct MockNode {
    pub name: String,
    pub adapters: usize,
    pub position: CanvasPosition,
}

#[derive(Default)]
struct LabState {
    next_id: u64,
    template_adapters: HashMap<String, usize>,
    deleted_templates: Vec<String>,
    nodes: HashMap<String, MockNode>,
    links: Vec<(LinkEndpoint, LinkEndpoint)>,
    closed: Vec<String>,
}

/// In-memory lab-management service with failure injection
#[derive(Default)]
pub struct MockLab {
    templates: Vec<LabTemplate>,
    fail_clone: HashSet<String>,
    fail_template_delete: bool,
    fail_close: bool,
    state: Mutex<LabState>,
}

impl MockLab {
    pub fn with_templates(templates: &[(&str, &str)]) -> Self {
        Self {
            templates: templates
                .iter()
                .map(|(id, image)| LabTemplate {
                    template_id: id.to_string(),
                    template_type: "docker".to_string(),
                    image: Some(image.to_string()),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn fail_clone_of(mut self, template_id: &str) -> Self {
        self.fail_clone.insert(template_id.to_string());
        self
    }

    pub fn fail_template_delete(mut self) -> Self {
        self.fail_template_delete = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn links(&self) -> Vec<(LinkEndpoint, LinkEndpoint)> {
        self.state.lock().unwrap().links.clone()
    }

    pub fn node_named(&self, name: &str) -> Option<MockNode> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .values()
            .find(|n| n.name == name)
            .cloned()
    }

    pub fn deleted_templates(&self) -> usize {
        self.state.lock().unwrap().deleted_templates.len()
    }

    pub fn closed_projects(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }
}

#[async_trait]
impl LabApi for MockLab {
    async fn create_project(&self, _name: &str) -> Result<String, ProvisionError> {
        Ok(self.next_id("project"))
    }

    async fn list_templates(&self) -> Result<Vec<LabTemplate>, ProvisionError> {
        Ok(self.templates.clone())
    }

    async fn clone_template(&self, template_id: &str) -> Result<String, ProvisionError> {
        if self.fail_clone.contains(template_id) {
            return Err(ProvisionError::lab(format!("500 duplicate {}", template_id)));
        }
        Ok(self.next_id("tmp"))
    }

    async fn set_template_adapters(&self, template_id: &str, adapters: usize) -> Result<(), ProvisionError> {
        self.state
            .lock()
            .unwrap()
            .template_adapters
            .insert(template_id.to_string(), adapters);
        Ok(())
    }

    async fn create_node_from_template(
        &self,
        _project_id: &str,
        template_id: &str,
        position: CanvasPosition,
    ) -> Result<String, ProvisionError> {
        let node_id = self.next_id("node");
        let mut state = self.state.lock().unwrap();
        let adapters = state.template_adapters.get(template_id).copied().unwrap_or(0);
        state.nodes.insert(
            node_id.clone(),
            MockNode {
                name: String::new(),
                adapters,
                position,
            },
        );
        Ok(node_id)
    }

    async fn delete_template(&self, template_id: &str) -> Result<(), ProvisionError> {
        if self.fail_template_delete {
            return Err(ProvisionError::lab("409 template in use"));
        }
        self.state
            .lock()
            .unwrap()
            .deleted_templates
            .push(template_id.to_string());
        Ok(())
    }

    async fn rename_node(&self, _project_id: &str, node_id: &str, name: &str) -> Result<(), ProvisionError> {
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| ProvisionError::lab(format!("404 node {}", node_id)))?;
        node.name = name.to_string();
        Ok(())
    }

    async fn node_container_id(&self, _project_id: &str, node_id: &str) -> Result<String, ProvisionError> {
        let state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get(node_id)
            .ok_or_else(|| ProvisionError::lab(format!("404 node {}", node_id)))?;
        Ok(format!("ctr-{}", node.name))
    }

    async fn create_link(
        &self,
        _project_id: &str,
        a: &LinkEndpoint,
        b: &LinkEndpoint,
    ) -> Result<String, ProvisionError> {
        let link_id = self.next_id("link");
        self.state.lock().unwrap().links.push((a.clone(), b.clone()));
        Ok(link_id)
    }

    async fn close_project(&self, project_id: &str) -> Result<(), ProvisionError> {
        if self.fail_close {
            return Err(ProvisionError::lab("503 unavailable"));
        }
        self.state.lock().unwrap().closed.push(project_id.to_string());
        Ok(())
    }

    fn project_url(&self, project_id: &str) -> String {
        format!("http://mock/project/{}", project_id)
    }
}

#[derive(Default)]
struct RuntimeState {
    running: HashMap<String, bool>,
    archives: HashMap<String, (String, Vec<u8>)>,
    execs: Vec<(String, Vec<String>)>,
}

/// In-memory container runtime. Containers are named `ctr-<device>`.
#[derive(Default)]
pub struct MockRuntime {
    never_ready: HashSet<String>,
    failing_exec: HashSet<String>,
    state: Mutex<RuntimeState>,
}

impl MockRuntime {
    pub fn never_ready(mut self, container_id: &str) -> Self {
        self.never_ready.insert(container_id.to_string());
        self
    }

    pub fn failing_exec(mut self, container_id: &str) -> Self {
        self.failing_exec.insert(container_id.to_string());
        self
    }

    pub fn is_stopped(&self, container_id: &str) -> bool {
        !self
            .state
            .lock()
            .unwrap()
            .running
            .get(container_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn archive(&self, container_id: &str) -> Option<(String, Vec<u8>)> {
        self.state.lock().unwrap().archives.get(container_id).cloned()
    }

    pub fn exec_count(&self) -> usize {
        self.state.lock().unwrap().execs.len()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn start(&self, container_id: &str) -> Result<(), ProvisionError> {
        let ready = !self.never_ready.contains(container_id);
        self.state
            .lock()
            .unwrap()
            .running
            .insert(container_id.to_string(), ready);
        Ok(())
    }

    async fn stop(&self, container_id: &str) -> Result<(), ProvisionError> {
        self.state
            .lock()
            .unwrap()
            .running
            .insert(container_id.to_string(), false);
        Ok(())
    }

    async fn is_running(&self, container_id: &str) -> Result<bool, ProvisionError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .running
            .get(container_id)
            .copied()
            .unwrap_or(false))
    }

    async fn put_archive(&self, container_id: &str, path: &str, archive: Vec<u8>) -> Result<(), ProvisionError> {
        self.state
            .lock()
            .unwrap()
            .archives
            .insert(container_id.to_string(), (path.to_string(), archive));
        Ok(())
    }

    async fn exec(&self, container_id: &str, cmd: &[&str]) -> Result<i64, ProvisionError> {
        self.state.lock().unwrap().execs.push((
            container_id.to_string(),
            cmd.iter().map(|s| s.to_string()).collect(),
        ));
        if self.failing_exec.contains(container_id) {
            return Ok(1);
        }
        Ok(0)
    }
}

use serde::{Deserialize, Serialize};

use crate::models::LinkEndpoint;

// --- GNS3 API types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTemplate {
    pub template_id: String,
    #[serde(default)]
    pub template_type: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Project {
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TemplateRef {
    pub template_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Node {
    pub node_id: String,
    #[serde(default)]
    pub properties: NodeProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct NodeProperties {
    #[serde(default)]
    pub container_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Link {
    pub link_id: String,
}

// --- Request bodies ---

#[derive(Debug, Serialize)]
pub(crate) struct ProjectCreate<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdaptersUpdate {
    pub adapters: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct NodeCreate {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct NodeRename<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LinkCreate<'a> {
    pub nodes: [&'a LinkEndpoint; 2],
}

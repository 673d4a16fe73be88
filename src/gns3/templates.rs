use std::collections::HashMap;

use super::types::LabTemplate;

/// Only container-backed templates can host a switch image
const DOCKER_TEMPLATE_TYPE: &str = "docker";

/// Container image repository the switch images are published under
const IMAGE_REPOSITORY: &str = "ceos";

/// Lookup from container image to lab template id
#[derive(Debug, Clone, Default)]
pub struct TemplateIndex {
    by_image: HashMap<String, String>,
}

impl TemplateIndex {
    pub fn new(templates: Vec<LabTemplate>) -> Self {
        let by_image = templates
            .into_iter()
            .filter(|t| t.template_type == DOCKER_TEMPLATE_TYPE)
            .filter_map(|t| t.image.map(|image| (image.to_lowercase(), t.template_id)))
            .collect();
        Self { by_image }
    }

    /// Template for a switch OS version, if one is installed
    pub fn lookup(&self, os_version: &str) -> Option<&str> {
        self.by_image.get(&image_key(os_version)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_image.len()
    }
}

/// Image a switch OS version runs as: `4.28.3M-28271.2` -> `ceos:4.28.3m`
pub fn image_key(os_version: &str) -> String {
    let version = os_version.to_lowercase();
    let release = version.split('-').next().unwrap_or(&version);
    format!("{}:{}", IMAGE_REPOSITORY, release)
}

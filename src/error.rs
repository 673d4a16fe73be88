use thiserror::Error;

use crate::models::FailureKind;

/// Errors raised while turning one device or one edge into lab state.
/// Each one is contained at the granularity of the item that raised it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("invalid port name '{port}'")]
    InvalidPortFormat { port: String },

    #[error("container {container_id} not running after {waited_secs}s")]
    ProvisioningTimeout { container_id: String, waited_secs: u64 },

    #[error("{service} API error: {message}")]
    ExternalApi { service: &'static str, message: String },

    #[error("cleanup failed: {0}")]
    Cleanup(String),

    #[error("no lab template for image '{image}'")]
    MissingTemplate { image: String },

    #[error("device '{identity}' has no lab node")]
    UnprovisionedEndpoint { identity: String },
}

impl ProvisionError {
    pub fn lab(message: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: "lab",
            message: message.into(),
        }
    }

    pub fn container(message: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: "container",
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedConfig(_) => FailureKind::MalformedConfig,
            Self::InvalidPortFormat { .. } => FailureKind::InvalidPortFormat,
            Self::ProvisioningTimeout { .. } => FailureKind::ProvisioningTimeout,
            Self::ExternalApi { .. } => FailureKind::ExternalApiError,
            Self::Cleanup(_) => FailureKind::CleanupFailure,
            Self::MissingTemplate { .. } => FailureKind::MissingTemplate,
            Self::UnprovisionedEndpoint { .. } => FailureKind::UnprovisionedEndpoint,
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(e: reqwest::Error) -> Self {
        Self::lab(e.to_string())
    }
}

impl From<bollard::errors::Error> for ProvisionError {
    fn from(e: bollard::errors::Error) -> Self {
        Self::container(e.to_string())
    }
}

use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

use crate::provision::ProvisionSettings;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub lab_server: String,
    pub project_name: String,
    pub lab_api_port: u16,
    pub lab_auth: Option<(String, String)>,
    pub docker_port: u16,
    pub switches: Vec<String>,
    pub eos_username: String,
    pub eos_password: String,
    pub poll_concurrency: usize,
    pub http_timeout_secs: u64,
    pub lab_call_pacing_ms: u64,
    pub container_poll_interval_ms: u64,
    pub container_ready_timeout_secs: u64,
    pub report_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| get_env(&lookup, key, default);
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let lab_server = optional("LAB_SERVER").ok_or_else(|| anyhow!("LAB_SERVER must be set"))?;

        let lab_auth = match (optional("LAB_API_USER"), optional("LAB_API_PASSWORD")) {
            (Some(user), Some(password)) => Some((user, password)),
            (Some(user), None) => Some((user, String::new())),
            _ => None,
        };

        let switches = match (optional("SWITCH_LIST_FILE"), optional("SWITCHES")) {
            (Some(_), Some(_)) => {
                return Err(anyhow!("set only one of SWITCH_LIST_FILE and SWITCHES"));
            }
            (Some(path), None) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading switch list {}", path))?;
                parse_switch_list(&contents)
            }
            (None, Some(list)) => parse_switch_list(&list),
            (None, None) => Vec::new(),
        };

        let project_name = optional("LAB_PROJECT_NAME").unwrap_or_else(|| {
            let id = uuid::Uuid::new_v4().simple().to_string();
            format!("lab-mirror-{}", &id[..8])
        });

        Ok(Self {
            lab_server,
            project_name,
            lab_api_port: get("LAB_API_PORT", "3080").parse().unwrap_or(3080),
            lab_auth,
            docker_port: get("DOCKER_PORT", "2375").parse().unwrap_or(2375),
            switches,
            eos_username: get("EOS_USERNAME", "admin"),
            eos_password: get("EOS_PASSWORD", ""),
            poll_concurrency: get("POLL_CONCURRENCY", "20").parse().unwrap_or(20),
            http_timeout_secs: get("HTTP_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            lab_call_pacing_ms: get("LAB_CALL_PACING_MS", "200").parse().unwrap_or(200),
            container_poll_interval_ms: get("CONTAINER_POLL_INTERVAL_MS", "1000")
                .parse()
                .unwrap_or(1000),
            container_ready_timeout_secs: get("CONTAINER_READY_TIMEOUT_SECS", "20")
                .parse()
                .unwrap_or(20),
            report_path: optional("REPORT_PATH"),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            lab_call_pacing: Duration::from_millis(self.lab_call_pacing_ms),
            container_poll_interval: Duration::from_millis(self.container_poll_interval_ms),
            container_ready_timeout: Duration::from_secs(self.container_ready_timeout_secs),
        }
    }
}

/// One switch per line or comma-separated entry; blanks are dropped
pub fn parse_switch_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == '\n' || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

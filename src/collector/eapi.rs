use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{Collected, DeviceCollector};
use crate::models::{Edge, HardwareFacts, RawDevice};

const FACT_COMMANDS: &[&str] = &["show version", "show lldp neighbors", "show lldp local-info"];
const CONFIG_COMMAND: &str = "show running-config";

/// Arista eAPI client (JSON-RPC over HTTPS)
pub struct EapiCollector {
    username: String,
    password: String,
    client: Client,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: &'static str,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    version: u32,
    cmds: &'a [&'a str],
    format: &'static str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowVersion {
    model_name: String,
    version: String,
    system_mac_address: String,
    serial_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LldpNeighbors {
    #[serde(default)]
    lldp_neighbors: Vec<LldpNeighbor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LldpNeighbor {
    port: String,
    neighbor_device: String,
    neighbor_port: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LldpLocalInfo {
    system_name: String,
}

#[derive(Deserialize)]
struct TextOutput {
    output: String,
}

impl EapiCollector {
    pub fn new(username: String, password: String, timeout: Duration) -> Result<Self> {
        // Switch management certificates are self-signed
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            username,
            password,
            client,
        })
    }

    async fn run_cmds(&self, host: &str, cmds: &[&str], format: &'static str) -> Result<Vec<Value>> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RpcParams {
                version: 1,
                cmds,
                format,
            },
            id: "lab-mirror",
        };

        let resp = self
            .client
            .post(format!("https://{}/command-api", host))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("eAPI error {}: {}", status, text));
        }

        let rpc: RpcResponse = resp.json().await?;
        if let Some(err) = rpc.error {
            return Err(anyhow!("eAPI command failed ({}): {}", err.code, err.message));
        }
        let result = rpc.result.ok_or_else(|| anyhow!("eAPI response has no result"))?;
        if result.len() != cmds.len() {
            return Err(anyhow!("eAPI returned {} results for {} commands", result.len(), cmds.len()));
        }
        Ok(result)
    }
}

#[async_trait]
impl DeviceCollector for EapiCollector {
    async fn collect(&self, host: &str) -> Result<Collected> {
        let facts = self
            .run_cmds(host, FACT_COMMANDS, "json")
            .await
            .with_context(|| format!("polling {}", host))?;
        let config = self
            .run_cmds(host, &[CONFIG_COMMAND], "text")
            .await
            .with_context(|| format!("reading running-config from {}", host))?;

        device_from_outputs(host, &facts, &config)
    }
}

/// Build a device and its neighbor observations from eAPI results:
/// `facts` holds the outputs of FACT_COMMANDS in order, `config` the text
/// output of the running-config command
pub fn device_from_outputs(host: &str, facts: &[Value], config: &[Value]) -> Result<Collected> {
    let [version, neighbors, local] = facts else {
        return Err(anyhow!("expected {} outputs, got {}", FACT_COMMANDS.len(), facts.len()));
    };
    let version: ShowVersion = serde_json::from_value(version.clone()).context("parsing show version")?;
    let neighbors: LldpNeighbors =
        serde_json::from_value(neighbors.clone()).context("parsing show lldp neighbors")?;
    let local: LldpLocalInfo = serde_json::from_value(local.clone()).context("parsing show lldp local-info")?;

    let running = config.first().ok_or_else(|| anyhow!("missing running-config output"))?;
    let running: TextOutput = serde_json::from_value(running.clone()).context("parsing running-config")?;

    let adjacencies = neighbors
        .lldp_neighbors
        .into_iter()
        .map(|n| Edge::new(local.system_name.clone(), n.port, n.neighbor_device, n.neighbor_port))
        .collect();

    Ok(Collected {
        device: RawDevice {
            name: host.to_string(),
            lldp_system_name: local.system_name,
            facts: HardwareFacts {
                model: version.model_name,
                os_version: version.version,
                system_mac: version.system_mac_address,
                serial_number: version.serial_number,
            },
            config: running.output.lines().map(str::to_string).collect(),
        },
        adjacencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fact_outputs() -> Vec<Value> {
        vec![
            json!({
                "modelName": "DCS-7050SX3-48YC8",
                "version": "4.28.3M-28271.2",
                "systemMacAddress": "00:1c:73:aa:bb:cc",
                "serialNumber": "JPE12345678",
                "uptime": 1234.5
            }),
            json!({
                "tablesLastChangeTime": 1700000000.0,
                "lldpNeighbors": [
                    {"port": "Ethernet1", "neighborDevice": "leaf1", "neighborPort": "Ethernet49/1", "ttl": 120},
                    {"port": "Management1", "neighborDevice": "oob-sw", "neighborPort": "Gi0/12", "ttl": 120}
                ]
            }),
            json!({"systemName": "spine1", "chassisId": "001c.73aa.bbcc"}),
        ]
    }

    #[test]
    fn test_device_from_outputs() {
        let config = vec![json!({"output": "hostname spine1\ninterface Ethernet1\n!\nend\n"})];
        let collected = device_from_outputs("10.0.0.1", &fact_outputs(), &config).unwrap();

        let device = &collected.device;
        assert_eq!(device.name, "10.0.0.1");
        assert_eq!(device.lldp_system_name, "spine1");
        assert_eq!(device.facts.model, "DCS-7050SX3-48YC8");
        assert_eq!(device.facts.os_version, "4.28.3M-28271.2");
        assert_eq!(device.facts.system_mac, "00:1c:73:aa:bb:cc");
        assert_eq!(device.facts.serial_number, "JPE12345678");
        assert_eq!(device.config, vec!["hostname spine1", "interface Ethernet1", "!", "end"]);

        assert_eq!(
            collected.adjacencies,
            vec![
                Edge::new("spine1", "Ethernet1", "leaf1", "Ethernet49/1"),
                Edge::new("spine1", "Management1", "oob-sw", "Gi0/12"),
            ]
        );
    }

    #[test]
    fn test_no_neighbors() {
        let mut facts = fact_outputs();
        facts[1] = json!({"lldpNeighbors": []});
        let config = vec![json!({"output": "end"})];
        let collected = device_from_outputs("spine1", &facts, &config).unwrap();
        assert!(collected.adjacencies.is_empty());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut facts = fact_outputs();
        facts[0] = json!({"modelName": "vEOS"});
        let config = vec![json!({"output": "end"})];
        let err = device_from_outputs("spine1", &facts, &config).unwrap_err();
        assert!(err.to_string().contains("show version"));

        assert!(device_from_outputs("spine1", &fact_outputs()[..2], &config).is_err());
        assert!(device_from_outputs("spine1", &fact_outputs(), &[]).is_err());
    }
}

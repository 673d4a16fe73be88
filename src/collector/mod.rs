pub mod eapi;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::ProvisionError;
use crate::models::{Edge, FailureRecord, Inventory, Phase, RawDevice};

pub use eapi::EapiCollector;

/// What one switch reports about itself
#[derive(Debug, Clone)]
pub struct Collected {
    pub device: RawDevice,
    pub adjacencies: Vec<Edge>,
}

/// Source of device facts, configuration and neighbor observations
#[async_trait]
pub trait DeviceCollector: Send + Sync {
    async fn collect(&self, host: &str) -> Result<Collected>;
}

/// Poll every host with at most `concurrency` requests in flight.
/// Results keep the order of `hosts`; an unreachable host is recorded as a
/// failure and never holds up the rest.
pub async fn collect_fleet(collector: &dyn DeviceCollector, hosts: &[String], concurrency: usize) -> Inventory {
    let results: Vec<(&String, Result<Collected>)> = stream::iter(hosts)
        .map(|host| async move { (host, collector.collect(host).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut inventory = Inventory::default();
    for (host, result) in results {
        match result {
            Ok(collected) => {
                tracing::info!(
                    "Collected {} ({}, {} neighbors)",
                    host,
                    collected.device.facts.os_version,
                    collected.adjacencies.len()
                );
                inventory.devices.push(collected.device);
                inventory.adjacencies.extend(collected.adjacencies);
            }
            Err(e) => {
                tracing::warn!("Failed to collect {}: {:#}", host, e);
                let err = ProvisionError::ExternalApi {
                    service: "eapi",
                    message: format!("{:#}", e),
                };
                inventory
                    .failures
                    .push(FailureRecord::new(host.as_str(), Phase::Collect, &err));
            }
        }
    }
    inventory
}

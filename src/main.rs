mod collector;
mod config;
mod docker;
mod error;
mod gns3;
mod models;
mod provision;
mod sanitizer;
mod topology;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collector::{collect_fleet, EapiCollector};
use config::Config;
use docker::DockerRuntime;
use gns3::Gns3Client;
use models::RunStatus;
use provision::ReplicationOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lab_mirror=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load()?;
    if cfg.switches.is_empty() {
        anyhow::bail!("No switches configured: set SWITCH_LIST_FILE or SWITCHES");
    }
    tracing::info!("Starting Lab Mirror");
    tracing::info!("Lab server: {}:{}", cfg.lab_server, cfg.lab_api_port);
    tracing::info!("Docker: {}:{}", cfg.lab_server, cfg.docker_port);
    tracing::info!("Switches: {}", cfg.switches.len());

    // Poll the fleet
    let collector = EapiCollector::new(cfg.eos_username.clone(), cfg.eos_password.clone(), cfg.http_timeout())?;
    let inventory = collect_fleet(&collector, &cfg.switches, cfg.poll_concurrency).await;
    tracing::info!(
        "Collected {} of {} switches",
        inventory.devices.len(),
        cfg.switches.len()
    );

    // Replicate into the lab
    let lab = Gns3Client::new(
        &cfg.lab_server,
        cfg.lab_api_port,
        cfg.lab_auth.clone(),
        cfg.http_timeout(),
    )?;
    let runtime = DockerRuntime::connect(&cfg.lab_server, cfg.docker_port, cfg.http_timeout_secs)?;
    let orchestrator = ReplicationOrchestrator::new(Arc::new(lab), Arc::new(runtime), cfg.provision_settings());

    let report = orchestrator.run(&cfg.project_name, inventory).await?;

    println!("Project: {}", report.project_url);
    println!(
        "{} devices, {} links, {} failures",
        report.devices.iter().filter(|d| d.configured).count(),
        report.links.iter().filter(|l| l.link_id.is_some()).count(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {} [{:?}/{:?}]: {}", failure.subject, failure.phase, failure.kind, failure.message);
    }
    for warning in &report.warnings {
        println!("  warning: {}: {}", warning.subject, warning.message);
    }

    if let Some(path) = &cfg.report_path {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json).await?;
        tracing::info!("Report written to {}", path);
    }

    if report.status == RunStatus::PartialFailure {
        tracing::warn!("Replication completed with {} failures", report.failures.len());
    }

    Ok(())
}

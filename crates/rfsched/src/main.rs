mod cli;
mod metrics_server;

use clap::Parser;
use cli::{Cli, LogFormat};
use metrics_server::MetricsServer;
use rfsched_client::{ApiClient, ClusterConnection};
use rfsched_core::{BindingMetrics, LabelContract};
use rfsched_scheduler::{Scheduler, SchedulerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli);

    let contract = LabelContract::new(
        cli.label_prefix.as_str(),
        cli.name.as_str(),
        cli.label_scheme,
    )?;
    let config = SchedulerConfig::new(contract)
        .with_namespaces(cli.namespaces.iter().map(|ns| ns.trim().to_string()))
        .with_concurrency(cli.concurrency);
    let delay = cli.delay()?;

    let kubeconfig = cli.kubeconfig_path();
    let connection = ClusterConnection::resolve(
        cli.api_url.as_deref(),
        kubeconfig.as_deref(),
        cli.incluster_base_path.as_deref(),
    )?;
    info!("Using API server {}", connection.server);

    let metrics = Arc::new(BindingMetrics::new());
    let client = ApiClient::new(&connection, cli.name.as_str(), metrics.clone())?;
    let scheduler = Scheduler::new(Arc::new(client), config)?;

    let metrics_handle = if !cli.metrics_enabled() {
        None
    } else {
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.prometheus_port));
        let handle = MetricsServer::new(addr, metrics)
            .spawn()
            .await
            .map_err(|e| miette::miette!("Failed to bind metrics endpoint on {}: {}", addr, e))?;
        Some(handle)
    };

    let result = if cli.daemon {
        tokio::select! {
            result = scheduler.run_forever(delay) => result.map_err(miette::Report::from),
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;
                info!("Shutting down gracefully...");
                Ok(())
            }
        }
    } else {
        scheduler
            .run_once()
            .await
            .map(|_| ())
            .map_err(miette::Report::from)
    };

    if let Some(handle) = metrics_handle {
        handle.abort();
    }

    result
}

/// Install the global subscriber: RUST_LOG if set, else the -v ladder
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

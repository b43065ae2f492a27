//! LWS Operator - HorizontalPodAutoscaler management for LeaderWorkerSets

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};
use tokio_util::sync::CancellationToken;

use lws_operator::config::OperatorConfig;
use lws_operator::controller::{error_policy, reconcile, Context};
use lws_operator::crd::{crd_yaml, LeaderWorkerSet};
use lws_operator::telemetry::{init_telemetry, TelemetryConfig};

/// LWS Operator - keeps LeaderWorkerSet autoscalers in sync with their scale policy
#[derive(Parser, Debug)]
#[command(name = "lws-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    #[command(flatten)]
    config: OperatorConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as controller (default mode)
    ///
    /// Watches LeaderWorkerSets and the HorizontalPodAutoscalers they own,
    /// creating or updating an HPA whenever a scale policy with metrics is set.
    Controller,

    /// Print the LeaderWorkerSet CRD and exit
    Crd,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd || matches!(cli.command, Some(Commands::Crd)) {
        println!("{}", crd_yaml()?);
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        format: cli.config.log_format,
        filter: None,
    })?;

    cli.config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    match cli.command {
        Some(Commands::Controller) | None => run_controller(cli.config).await,
        Some(Commands::Crd) => Ok(()),
    }
}

/// Run the LeaderWorkerSet controller until a shutdown signal arrives
async fn run_controller(config: OperatorConfig) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    let (lws_api, hpa_api): (Api<LeaderWorkerSet>, Api<HorizontalPodAutoscaler>) =
        match config.watch_namespace.as_deref() {
            Some(ns) => (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client.clone(), ns),
            ),
            None => (Api::all(client.clone()), Api::all(client.clone())),
        };

    // Cancels in-flight storage calls once shutdown starts
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal_cancel.cancel();
    });

    let ctx = Arc::new(Context::new(client, &config, cancel));
    let watcher_config = || WatcherConfig::default().timeout(config.watch_timeout_secs);

    tracing::info!(
        field_manager = %config.field_manager,
        namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        "Starting LeaderWorkerSet controller"
    );

    Controller::new(lws_api, watcher_config())
        .owns(hpa_api, watcher_config())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(log_reconcile_result("LeaderWorkerSet"))
        .await;

    tracing::info!("Controller stopped");
    Ok(())
}

/// Creates a closure for logging reconciliation results.
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}

//! Edge router controller.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐  annotations, services,   ┌──────────────┐
//!   │  Kubernetes  │  endpoints, secrets       │   synth +    │
//!   │  API server  │──────────────────────────▶│   binder     │
//!   └──────────────┘                           └──────┬───────┘
//!                                                     │ RouterConfig
//!                                                     ▼
//!   ┌──────────────┐   reload    ┌──────────┐   ┌──────────────┐
//!   │    nginx     │◀────────────│  proxy   │◀──│  reconcile   │
//!   │              │  nginx.conf │ renderer │   │  (rate-      │
//!   └──────────────┘  ssl/*.crt  └──────────┘   │   limited)   │
//!                        ▲                      └──────┬───────┘
//!                        └──── materialize ◀───────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use edge_router::cluster::KubeClient;
use edge_router::config::load_settings;
use edge_router::lifecycle::{wait_for_signal, Shutdown};
use edge_router::observability::{init_logging, metrics};
use edge_router::proxy::{CommandReloader, NginxRenderer};
use edge_router::{Reconciler, Synthesizer, TickOutcome};

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Keeps an nginx edge proxy in sync with cluster routing annotations", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long, env = "EDGE_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Namespace holding the router's own resources; overrides settings and POD_NAMESPACE.
    #[arg(short, long)]
    namespace: Option<String>,

    /// Run a single reconcile tick and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut settings, overrides) = load_settings(cli.config.as_deref())?;
    if let Some(namespace) = cli.namespace {
        settings.discovery.namespace = namespace;
    }

    init_logging(&settings.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-router starting");
    for env_override in &overrides {
        env_override.log();
    }

    if settings.observability.metrics_enabled {
        let addr = settings.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let cluster = Arc::new(KubeClient::in_cluster(&settings.cluster)?);
    let mut reconciler = Reconciler::new(
        cluster,
        Synthesizer::new(settings.discovery.clone()),
        Arc::new(NginxRenderer::new(&settings.proxy.ssl_dir)),
        Arc::new(CommandReloader::new(settings.proxy.reload_command.clone())),
        &settings.proxy,
        &settings.reconcile,
    );

    if cli.once {
        let outcome = reconciler.run_once().await;
        return match outcome {
            TickOutcome::Applied | TickOutcome::Unchanged => Ok(()),
            failed => Err(format!("reconcile tick failed: {}", failed.as_str()).into()),
        };
    }

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(reconciler.run(shutdown.subscribe()));

    let signal = wait_for_signal().await;
    tracing::info!(signal, "Shutdown signal received");
    shutdown.trigger();
    handle.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

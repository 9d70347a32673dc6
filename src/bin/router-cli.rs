use std::path::PathBuf;

use clap::{Parser, Subcommand};

use edge_router::cluster::KubeClient;
use edge_router::config::load_settings;
use edge_router::proxy::{NginxRenderer, Renderer};
use edge_router::Synthesizer;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Inspect what the edge router would apply", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace holding the router's own resources.
    #[arg(short, long)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the synthesized snapshot as JSON (private keys omitted)
    Snapshot,
    /// Print the nginx.conf the snapshot renders to
    Render,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut settings, _) = load_settings(cli.config.as_deref())?;
    if let Some(namespace) = cli.namespace {
        settings.discovery.namespace = namespace;
    }

    let cluster = KubeClient::in_cluster(&settings.cluster)?;
    let synthesizer = Synthesizer::new(settings.discovery.clone());
    let snapshot = synthesizer.build(&cluster).await?;

    match cli.command {
        Commands::Snapshot => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Render => {
            let renderer = NginxRenderer::new(&settings.proxy.ssl_dir);
            print!("{}", renderer.render(&snapshot)?);
        }
    }

    Ok(())
}

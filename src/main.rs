use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal::ctrl_c;
use tracing::{error, info};

use ragedb::config::{self, ShardConfig};
use ragedb::peered::health;
use ragedb::Cluster;

/// RageDB shard core: an in-memory, shared-nothing property-graph engine.
#[derive(Parser, Debug)]
#[command(name = "ragedb", version)]
struct Cli {
    /// Path to the configuration file. Default: built-in [`ShardConfig::default`].
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => match config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => ShardConfig::default(),
    };

    info!(shards = cfg.shards, "starting shard cluster");
    let cluster = Cluster::new(&cfg);

    if !health::all_healthy(&cluster).await {
        error!("one or more shards failed their startup health check");
        return ExitCode::FAILURE;
    }
    info!("all shards healthy, serving in-process");

    let _ = ctrl_c().await;
    info!("shutting down");
    ExitCode::SUCCESS
}

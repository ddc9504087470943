//! Clinical risk HTTP service

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clinrisk_core::{BundleLoader, EngineConfig, RiskEngine};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinrisk-service")]
#[command(about = "Clinical risk assessment HTTP service")]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artifact bundle directory; overrides the configuration
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(dir) = cli.artifacts {
        config.artifacts.dir = dir;
    }
    if let Some(host) = cli.host {
        config.service.host = host;
    }
    if let Some(port) = cli.port {
        config.service.port = port;
    }

    info!("Starting clinrisk service v{}", clinrisk_core::VERSION);

    let loader = BundleLoader::new(&config.artifacts.dir, config.artifacts.paths.clone());
    let bundle = loader.get_or_load().with_context(|| {
        format!(
            "failed to load artifact bundle from {}",
            config.artifacts.dir.display()
        )
    })?;
    let engine = RiskEngine::from_config(bundle, &config).context("failed to build risk engine")?;

    let addr = format!("{}:{}", config.service.host, config.service.port);
    clinrisk_service::serve(Arc::new(engine), &addr).await
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

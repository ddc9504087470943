//! Score one observation against an artifact bundle from the command line.
//!
//! Reads a JSON object from INPUT (or stdin) and prints the assessment.
//! Exits with status 2 when the observation itself is rejected.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clinrisk_core::{ArtifactBundle, ClinicalObservation, EngineConfig, RiskEngine, RiskError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "assess")]
#[command(about = "Assess clinical risk for a single observation")]
#[command(version)]
struct Cli {
    /// Directory holding the artifact bundle
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Include the attribution baseline and raw output
    #[arg(long)]
    detail: bool,

    /// Observation JSON file; stdin when omitted
    input: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    init_logging()?;
    let cli = Cli::parse();
    let mut config = EngineConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(dir) = cli.artifacts {
        config.artifacts.dir = dir;
    }

    let bundle = ArtifactBundle::load(&config.artifacts.dir, &config.artifacts.paths)
        .with_context(|| {
            format!(
                "failed to load artifact bundle from {}",
                config.artifacts.dir.display()
            )
        })?;
    let engine = RiskEngine::from_config(Arc::new(bundle), &config)?;

    let raw = read_input(cli.input.as_ref())?;
    let observation: ClinicalObservation =
        serde_json::from_str(&raw).context("observation must be a JSON object")?;

    match run(&engine, &observation, cli.detail) {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_client_error() => {
            let report = serde_json::to_string_pretty(&err.report())
                .context("failed to serialize error report")?;
            eprintln!("{report}");
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err.into()),
    }
}

fn run(
    engine: &RiskEngine,
    observation: &ClinicalObservation,
    detail: bool,
) -> Result<String, RiskError> {
    let assessment = engine.assess(observation)?;
    let value = if detail {
        let explanation = engine.explain(observation)?;
        serde_json::json!({
            "assessment": assessment,
            "baseline": explanation.baseline,
            "raw_output": explanation.raw_output,
            "bundle_fingerprint": engine.bundle().fingerprint(),
        })
    } else {
        serde_json::to_value(&assessment).map_err(|e| RiskError::Config(e.to_string()))?
    };
    serde_json::to_string_pretty(&value).map_err(|e| RiskError::Config(e.to_string()))
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read observation from stdin")?;
            Ok(buf)
        }
    }
}

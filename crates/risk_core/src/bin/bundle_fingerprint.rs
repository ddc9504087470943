use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clinrisk_core::{ArtifactBundle, ArtifactPaths};

fn main() -> Result<()> {
    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: bundle_fingerprint <artifacts_dir>")?;

    let bundle = ArtifactBundle::load(&dir, &ArtifactPaths::default())
        .with_context(|| format!("Failed to load bundle from {}", dir.display()))?;

    println!("{}", bundle.fingerprint());
    Ok(())
}

//! Engine configuration
//!
//! Loaded from TOML (or defaults), then overridden from the environment,
//! then validated. Example:
//!
//! ```toml
//! [artifacts]
//! dir = "models"
//!
//! [triage]
//! moderate_threshold = 0.3
//! high_threshold = 0.6
//!
//! [features]
//! reject_unknown_fields = true
//! required = ["Insulin"]
//!
//! [features.defaults]
//! Age = 33.0
//! ```

use crate::bundle::ArtifactPaths;
use crate::errors::{Result, RiskError};
use crate::schema::{FeatureSchema, FeatureSpec};
use crate::triage::TriageThresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub artifacts: ArtifactsConfig,
    pub triage: TriageThresholds,
    pub features: FeaturesConfig,
    pub service: ServiceConfig,
}

/// Where the bundle lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    #[serde(flatten)]
    pub paths: ArtifactPaths,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            paths: ArtifactPaths::default(),
        }
    }
}

/// Input handling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Reject observation keys that match no canonical feature
    pub reject_unknown_fields: bool,
    /// Canonical name → imputation default override
    pub defaults: BTreeMap<String, f64>,
    /// Canonical names whose built-in default is removed
    pub required: Vec<String>,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            reject_unknown_fields: true,
            defaults: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// Bind address of the HTTP shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RiskError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RiskError::Config(format!("failed to parse config: {e}")))
    }

    /// Apply `CLINRISK_*` overrides read through `lookup`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("CLINRISK_ARTIFACTS_DIR") {
            self.artifacts.dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("CLINRISK_HOST") {
            self.service.host = host;
        }
        override_parsed(&lookup, "CLINRISK_PORT", &mut self.service.port);
        override_parsed(
            &lookup,
            "CLINRISK_MODERATE_THRESHOLD",
            &mut self.triage.moderate_threshold,
        );
        override_parsed(&lookup, "CLINRISK_HIGH_THRESHOLD", &mut self.triage.high_threshold);
    }

    pub fn validate(&self) -> Result<()> {
        self.triage.validate().map_err(RiskError::Config)?;
        self.schema().map(|_| ())
    }

    /// Built-in schema with this configuration's default overrides applied.
    pub fn schema(&self) -> Result<FeatureSchema> {
        let mut schema = FeatureSchema::default();

        for (name, value) in &self.features.defaults {
            if self.features.required.contains(name) {
                return Err(RiskError::Config(format!(
                    "{name} is listed as required but also has a default"
                )));
            }
            if !value.is_finite() {
                return Err(RiskError::Config(format!("default for {name} is not finite")));
            }
            match schema.spec_mut(name) {
                Some(spec) => {
                    spec.check_range(*value).map_err(|e| {
                        RiskError::Config(format!("default for {name}: {e}"))
                    })?;
                    spec.default = Some(*value);
                }
                None => {
                    debug!(feature = %name, "default configured for feature outside the built-in schema");
                    let mut spec = FeatureSpec::bare(name);
                    spec.default = Some(*value);
                    schema.features.push(spec);
                }
            }
        }

        for name in &self.features.required {
            match schema.spec_mut(name) {
                Some(spec) => spec.default = None,
                None => warn!(feature = %name, "required feature is not in the schema"),
            }
        }

        Ok(schema)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable override"),
        }
    }
}

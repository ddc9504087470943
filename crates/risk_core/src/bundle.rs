//! Artifact bundle loading and validation
//!
//! A bundle is three artifacts produced by the training side, stored under
//! stable file names in one directory:
//!
//! - `features.json`: ordered canonical feature names
//! - `scaler.json`: fitted per-feature center/scale
//! - `classifier.json`: fitted classifier, tagged by `family`
//!
//! Loading validates the three against each other and fails as a whole; a
//! half-loaded bundle is never handed out. Once built the bundle is
//! immutable and is shared across requests behind an `Arc`.

use crate::classifier::Classifier;
use crate::errors::{Result, RiskError};
use crate::explainer::ExplanationStrategy;
use crate::scaler::Scaler;
use crate::serde_canon::fingerprint_hex;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// File names of the three artifacts inside a bundle directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub scaler_file: String,
    pub classifier_file: String,
    pub features_file: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            scaler_file: "scaler.json".to_string(),
            classifier_file: "classifier.json".to_string(),
            features_file: "features.json".to_string(),
        }
    }
}

/// Immutable {scaler, classifier, feature order} triple
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    feature_order: Vec<String>,
    scaler: Scaler,
    classifier: Classifier,
    strategy: ExplanationStrategy,
    baseline: f64,
    fingerprint: String,
}

#[derive(Serialize)]
struct FingerprintView<'a> {
    features: &'a [String],
    scaler: &'a Scaler,
    classifier: &'a Classifier,
}

impl ArtifactBundle {
    /// Validate the three artifacts against each other and bind the
    /// explanation strategy for the classifier family.
    pub fn from_parts(
        feature_order: Vec<String>,
        scaler: Scaler,
        classifier: Classifier,
    ) -> Result<Self> {
        if feature_order.is_empty() {
            return Err(RiskError::ArtifactLoad("feature order is empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = feature_order.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(RiskError::ArtifactLoad(format!(
                "feature '{dup}' appears more than once in the feature order"
            )));
        }

        scaler
            .validate()
            .map_err(|e| RiskError::ArtifactLoad(format!("scaler: {e}")))?;
        classifier
            .validate()
            .map_err(|e| RiskError::ArtifactLoad(format!("classifier: {e}")))?;

        if classifier.n_features() != feature_order.len() {
            return Err(RiskError::ArtifactLoad(format!(
                "classifier expects {} features but the feature order lists {}",
                classifier.n_features(),
                feature_order.len()
            )));
        }
        if scaler.width() != feature_order.len() {
            return Err(RiskError::ArtifactLoad(format!(
                "scaler was fitted on {} features but the feature order lists {}",
                scaler.width(),
                feature_order.len()
            )));
        }

        classifier.ensure_calibrated()?;

        let strategy = ExplanationStrategy::select(&classifier);
        let baseline = match strategy.baseline(&classifier) {
            Some(b) if b.is_finite() => b,
            Some(b) => {
                return Err(RiskError::ArtifactLoad(format!(
                    "explanation baseline is not finite: {b}"
                )))
            }
            None => 0.0,
        };
        if let ExplanationStrategy::Unavailable { reason } = &strategy {
            warn!(family = classifier.family(), %reason, "feature attribution unavailable for this bundle");
        }

        let fingerprint = fingerprint_hex(&FingerprintView {
            features: &feature_order,
            scaler: &scaler,
            classifier: &classifier,
        })
        .map_err(|e| RiskError::ArtifactLoad(format!("fingerprint: {e}")))?;

        Ok(Self {
            feature_order,
            scaler,
            classifier,
            strategy,
            baseline,
            fingerprint,
        })
    }

    /// Load and validate a bundle directory
    #[instrument(skip(dir, paths), fields(path = %dir.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(dir: P, paths: &ArtifactPaths) -> Result<Self> {
        let dir = dir.as_ref();
        let feature_order: Vec<String> = read_artifact(&dir.join(&paths.features_file))?;
        let scaler: Scaler = read_artifact(&dir.join(&paths.scaler_file))?;
        let classifier: Classifier = read_artifact(&dir.join(&paths.classifier_file))?;

        let bundle = Self::from_parts(feature_order, scaler, classifier)?;
        info!(
            fingerprint = %bundle.fingerprint,
            family = bundle.classifier.family(),
            features = bundle.feature_order.len(),
            explanation = bundle.strategy.is_available(),
            "artifact bundle loaded"
        );
        Ok(bundle)
    }

    /// Write the three artifacts into `dir` using `paths`.
    pub fn save<P: AsRef<Path>>(&self, dir: P, paths: &ArtifactPaths) -> Result<()> {
        let dir = dir.as_ref();
        write_artifact(&dir.join(&paths.features_file), &self.feature_order)?;
        write_artifact(&dir.join(&paths.scaler_file), &self.scaler)?;
        write_artifact(&dir.join(&paths.classifier_file), &self.classifier)?;
        Ok(())
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn strategy(&self) -> &ExplanationStrategy {
        &self.strategy
    }

    /// Expected raw classifier output over the training population
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Blake3 fingerprint of the canonical artifact contents
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| RiskError::ArtifactLoad(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| RiskError::ArtifactLoad(format!("cannot parse {}: {e}", path.display())))
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| RiskError::ArtifactLoad(format!("cannot serialize {}: {e}", path.display())))?;
    fs::write(path, json)
        .map_err(|e| RiskError::ArtifactLoad(format!("cannot write {}: {e}", path.display())))
}

/// Lazily loads one bundle and memoizes it
///
/// Concurrent first callers block on a single load. A failed load is not
/// cached, so the next caller retries.
#[derive(Debug)]
pub struct BundleLoader {
    dir: PathBuf,
    paths: ArtifactPaths,
    cell: OnceCell<Arc<ArtifactBundle>>,
}

impl BundleLoader {
    pub fn new(dir: impl Into<PathBuf>, paths: ArtifactPaths) -> Self {
        Self {
            dir: dir.into(),
            paths,
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_load(&self) -> Result<Arc<ArtifactBundle>> {
        self.cell
            .get_or_try_init(|| ArtifactBundle::load(&self.dir, &self.paths).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<ArtifactBundle>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Aggregation, LogisticModel, Node, Tree, TreeEnsemble};
    use crate::scaler::ScalerKind;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    fn scaler(n: usize) -> Scaler {
        Scaler::new(ScalerKind::Standard, vec![0.0; n], vec![1.0; n])
    }

    fn linear(n: usize) -> Classifier {
        Classifier::Logistic(LogisticModel::new(vec![0.5; n], 0.0))
    }

    #[test]
    fn width_mismatch_is_fatal() {
        let err = ArtifactBundle::from_parts(names(3), scaler(3), linear(2)).unwrap_err();
        assert!(matches!(err, RiskError::ArtifactLoad(_)));

        let err = ArtifactBundle::from_parts(names(3), scaler(2), linear(3)).unwrap_err();
        assert!(matches!(err, RiskError::ArtifactLoad(_)));
    }

    #[test]
    fn duplicate_feature_names_are_fatal() {
        let order = vec!["Age".to_string(), "Age".to_string()];
        assert!(ArtifactBundle::from_parts(order, scaler(2), linear(2)).is_err());
    }

    #[test]
    fn uncalibrated_classifier_is_fatal() {
        let tree = Tree::new(vec![Node::leaf(0, 1.0)], 1.0);
        let clf = Classifier::TreeEnsemble(TreeEnsemble::new(1, Aggregation::Vote, vec![tree]));
        let err = ArtifactBundle::from_parts(names(1), scaler(1), clf).unwrap_err();
        assert!(matches!(err, RiskError::UncalibratedModel(_)));
    }

    #[test]
    fn strategy_and_baseline_are_bound_at_construction() {
        let clf = Classifier::Logistic(LogisticModel::new(vec![1.0, 1.0], -0.7));
        let bundle = ArtifactBundle::from_parts(names(2), scaler(2), clf).unwrap();
        assert_eq!(bundle.strategy(), &ExplanationStrategy::Linear);
        assert_eq!(bundle.baseline(), -0.7);
        assert_eq!(bundle.fingerprint().len(), 64);
    }

    #[test]
    fn save_then_load_preserves_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ArtifactBundle::from_parts(names(2), scaler(2), linear(2)).unwrap();
        bundle.save(dir.path(), &ArtifactPaths::default()).unwrap();

        let loaded = ArtifactBundle::load(dir.path(), &ArtifactPaths::default()).unwrap();
        assert_eq!(loaded.fingerprint(), bundle.fingerprint());
        assert_eq!(loaded.feature_order(), bundle.feature_order());
    }

    #[test]
    fn missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ArtifactBundle::from_parts(names(2), scaler(2), linear(2)).unwrap();
        bundle.save(dir.path(), &ArtifactPaths::default()).unwrap();
        fs::remove_file(dir.path().join("scaler.json")).unwrap();

        let err = ArtifactBundle::load(dir.path(), &ArtifactPaths::default()).unwrap_err();
        assert!(err.to_string().contains("scaler.json"));
    }

    #[test]
    fn loader_memoizes_and_retries_failures() {
        let dir = tempfile::tempdir().unwrap();
        let loader = BundleLoader::new(dir.path(), ArtifactPaths::default());
        assert!(loader.get_or_load().is_err());
        assert!(loader.get().is_none());

        ArtifactBundle::from_parts(names(2), scaler(2), linear(2))
            .unwrap()
            .save(dir.path(), &ArtifactPaths::default())
            .unwrap();
        let first = loader.get_or_load().unwrap();
        let second = loader.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

//! Clinical risk-inference core
//!
//! Turns a partial clinical observation into a calibrated risk probability,
//! a triage bucket and a per-feature additive explanation, using a fitted
//! artifact bundle produced by an external training pipeline.
//!
//! Modules:
//! - `schema`: canonical feature names, aliases, imputation defaults, ranges
//! - `features`: observation → canonical feature vector
//! - `scaler`: fitted per-feature affine transform
//! - `classifier`: logistic and tree-ensemble classifiers
//! - `scorer`: scaling + classification → probability
//! - `explainer`: additive attribution (linear and tree-path)
//! - `triage`: probability → Stable / Moderate / High
//! - `bundle`: artifact loading, validation, fingerprinting
//! - `assessment`: the `RiskEngine` entry point
//! - `config`: TOML + environment configuration

pub mod assessment;
pub mod bundle;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod explainer;
pub mod features;
pub mod reference;
pub mod scaler;
pub mod schema;
pub mod scorer;
pub mod serde_canon;
pub mod triage;

pub use assessment::{to_risk_score, RiskAssessment, RiskEngine};
pub use bundle::{ArtifactBundle, ArtifactPaths, BundleLoader};
pub use classifier::{Aggregation, Classifier, LogisticModel, OutputUnits, TreeEnsemble};
pub use config::EngineConfig;
pub use errors::{ErrorReport, Result, RiskError};
pub use explainer::{Explanation, ExplanationStrategy};
pub use features::{CanonicalFeatureVector, ClinicalObservation, FeatureVectorBuilder};
pub use scaler::{Scaler, ScalerKind};
pub use schema::{FeatureSchema, FeatureSpec};
pub use triage::{TriageStatus, TriageThresholds};

/// Crate version string for health reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

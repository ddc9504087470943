//! Fitted binary classifiers
//!
//! A bundle carries exactly one classifier, tagged by `family` in its JSON
//! artifact:
//!
//! ```json
//! {"family":"logistic","n_features":8,"coefficients":[...],"intercept":-0.86}
//! {"family":"tree_ensemble","n_features":8,"aggregation":"mean","trees":[...]}
//! ```
//!
//! Every family exposes a raw output (log-odds or probability, depending on
//! the family) and a class-1 probability. Families that only yield hard
//! labels or uncalibrated margins are rejected when the bundle loads.

pub mod ensemble;
pub mod linear;
pub mod tree;

pub use ensemble::{Aggregation, TreeEnsemble};
pub use linear::{Link, LogisticModel};
pub use tree::{Node, Tree};

use crate::errors::{Result, RiskError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

/// Units of a classifier's raw output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputUnits {
    LogOdds,
    Probability,
}

impl Classifier {
    pub fn family(&self) -> &'static str {
        match self {
            Self::Logistic(_) => "logistic",
            Self::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    /// Input width the classifier was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Self::Logistic(m) => m.n_features,
            Self::TreeEnsemble(m) => m.n_features,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Logistic(m) => m.validate(),
            Self::TreeEnsemble(m) => m.validate(),
        }
    }

    /// Fails when the classifier cannot expose a calibrated probability.
    pub fn ensure_calibrated(&self) -> Result<()> {
        match self {
            Self::Logistic(m) if m.link == Link::Identity => Err(RiskError::UncalibratedModel(
                "linear model has an identity link; its margin is not a probability".into(),
            )),
            Self::TreeEnsemble(m) if m.aggregation == Aggregation::Vote => {
                Err(RiskError::UncalibratedModel(
                    "tree ensemble aggregates hard votes; no class probability available".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn output_units(&self) -> OutputUnits {
        match self {
            Self::Logistic(_) => OutputUnits::LogOdds,
            Self::TreeEnsemble(m) => match m.aggregation {
                Aggregation::Mean | Aggregation::Vote => OutputUnits::Probability,
                Aggregation::LogitSum => OutputUnits::LogOdds,
            },
        }
    }

    /// Raw output on a scaled vector, before any link function.
    pub fn raw_output(&self, scaled: &[f64]) -> f64 {
        match self {
            Self::Logistic(m) => m.margin(scaled),
            Self::TreeEnsemble(m) => m.raw_output(scaled),
        }
    }

    /// Class-1 probability on a scaled vector.
    pub fn probability(&self, scaled: &[f64]) -> Result<f64> {
        self.ensure_calibrated()?;
        let raw = self.raw_output(scaled);
        let p = match self.output_units() {
            OutputUnits::LogOdds => sigmoid(raw),
            OutputUnits::Probability => raw.clamp(0.0, 1.0),
        };
        Ok(p)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

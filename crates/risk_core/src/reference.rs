//! Reference diabetes-risk bundles
//!
//! Parameters of a logistic model and a small random forest fitted on the
//! eight-feature Pima cohort. Used by tests, benches and local runs; the
//! linear variant matches the JSON artifacts shipped under `models/`.

use crate::bundle::ArtifactBundle;
use crate::classifier::{Aggregation, Classifier, LogisticModel, Node, Tree, TreeEnsemble};
use crate::errors::Result;
use crate::scaler::{Scaler, ScalerKind};

pub const FEATURE_ORDER: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Population means
pub const SCALER_CENTER: [f64; 8] = [3.845, 120.895, 69.105, 20.536, 79.799, 31.993, 0.472, 33.241];

/// Population standard deviations
pub const SCALER_SCALE: [f64; 8] = [3.370, 31.973, 19.356, 15.952, 115.244, 7.884, 0.331, 11.760];

/// Logistic coefficients on standardized features
pub const COEFFICIENTS: [f64; 8] = [0.39, 1.10, -0.25, 0.01, -0.13, 0.69, 0.30, 0.18];

pub const INTERCEPT: f64 = -0.86;

fn feature_order() -> Vec<String> {
    FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
}

fn standard_scaler() -> Scaler {
    Scaler::new(ScalerKind::Standard, SCALER_CENTER.to_vec(), SCALER_SCALE.to_vec())
}

/// Standard scaler + logistic regression
pub fn linear_bundle() -> Result<ArtifactBundle> {
    ArtifactBundle::from_parts(
        feature_order(),
        standard_scaler(),
        Classifier::Logistic(LogisticModel::new(COEFFICIENTS.to_vec(), INTERCEPT)),
    )
}

/// Three-tree random forest over the standardized features
pub fn forest(with_covers: bool) -> TreeEnsemble {
    let c = |cover: f64| if with_covers { cover } else { 0.0 };

    // Feature indices: 1 Glucose, 2 BloodPressure, 5 BMI, 7 Age
    let t1 = Tree::new(
        vec![
            Node::internal(0, 1, 0.5, 1, 2).with_cover(c(614.0)),
            Node::internal(1, 5, 0.0, 3, 4).with_cover(c(400.0)),
            Node::internal(2, 7, 0.0, 5, 6).with_cover(c(214.0)),
            Node::leaf(3, 0.12).with_cover(c(220.0)),
            Node::leaf(4, 0.35).with_cover(c(180.0)),
            Node::leaf(5, 0.45).with_cover(c(90.0)),
            Node::leaf(6, 0.78).with_cover(c(124.0)),
        ],
        1.0,
    );
    let t2 = Tree::new(
        vec![
            Node::internal(0, 5, 0.3, 1, 2).with_cover(c(614.0)),
            Node::internal(1, 1, 1.0, 3, 4).with_cover(c(330.0)),
            Node::internal(2, 7, -0.5, 5, 6).with_cover(c(284.0)),
            Node::leaf(3, 0.15).with_cover(c(250.0)),
            Node::leaf(4, 0.55).with_cover(c(80.0)),
            Node::leaf(5, 0.30).with_cover(c(60.0)),
            Node::leaf(6, 0.70).with_cover(c(224.0)),
        ],
        1.0,
    );
    let t3 = Tree::new(
        vec![
            Node::internal(0, 1, 1.2, 1, 2).with_cover(c(614.0)),
            Node::leaf(1, 0.20).with_cover(c(480.0)),
            Node::internal(2, 2, 0.5, 3, 4).with_cover(c(134.0)),
            Node::leaf(3, 0.60).with_cover(c(100.0)),
            Node::leaf(4, 0.75).with_cover(c(34.0)),
        ],
        1.0,
    );

    TreeEnsemble::new(FEATURE_ORDER.len(), Aggregation::Mean, vec![t1, t2, t3])
}

/// Standard scaler + random forest; attribution needs `with_covers`.
pub fn forest_bundle(with_covers: bool) -> Result<ArtifactBundle> {
    ArtifactBundle::from_parts(
        feature_order(),
        standard_scaler(),
        Classifier::TreeEnsemble(forest(with_covers)),
    )
}

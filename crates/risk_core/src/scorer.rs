//! Scaling + classification of a canonical vector

use crate::bundle::ArtifactBundle;
use crate::errors::{Result, RiskError};
use crate::features::CanonicalFeatureVector;

/// Output of one scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVector {
    /// Vector after the bundle's scaler
    pub scaled: Vec<f64>,
    /// Classifier output before the link function
    pub raw_output: f64,
    /// Class-1 probability in [0, 1]
    pub probability: f64,
}

/// Scale `vector` and run the bundle's classifier on it.
pub fn score(bundle: &ArtifactBundle, vector: &CanonicalFeatureVector) -> Result<ScoredVector> {
    let width = bundle.feature_order().len();
    if vector.len() != width {
        return Err(RiskError::ArtifactLoad(format!(
            "feature vector has {} values but the bundle expects {}",
            vector.len(),
            width
        )));
    }

    let scaled = bundle.scaler().transform(vector.as_slice());
    let classifier = bundle.classifier();
    let probability = classifier.probability(&scaled)?;
    let raw_output = classifier.raw_output(&scaled);

    Ok(ScoredVector {
        scaled,
        raw_output,
        probability,
    })
}

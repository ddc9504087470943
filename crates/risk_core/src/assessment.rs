//! Risk assessment assembly
//!
//! [`RiskEngine`] is the single entry point transport layers call. It owns a
//! shared, immutable bundle plus the per-deployment input and triage policy,
//! and holds no mutable state, so one engine serves any number of threads.

use crate::bundle::ArtifactBundle;
use crate::config::EngineConfig;
use crate::errors::{Result, RiskError};
use crate::explainer::{explain, Explanation};
use crate::features::{CanonicalFeatureVector, ClinicalObservation, FeatureVectorBuilder};
use crate::schema::FeatureSchema;
use crate::scorer::score;
use crate::triage::{TriageStatus, TriageThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Result returned to callers for one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Probability × 100, rounded to two decimals
    pub risk_score: f64,
    pub status: TriageStatus,
    /// One signed attribution per canonical feature
    pub contributing_factors: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub explanation_unavailable: bool,
}

/// Round a probability to a percentage with two decimals.
pub fn to_risk_score(probability: f64) -> f64 {
    (probability * 10_000.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct RiskEngine {
    bundle: Arc<ArtifactBundle>,
    builder: FeatureVectorBuilder,
    thresholds: TriageThresholds,
}

impl RiskEngine {
    pub fn new(
        bundle: Arc<ArtifactBundle>,
        schema: &FeatureSchema,
        thresholds: TriageThresholds,
        reject_unknown_fields: bool,
    ) -> Result<Self> {
        thresholds.validate().map_err(RiskError::Config)?;
        let builder = FeatureVectorBuilder::new(schema, bundle.feature_order(), reject_unknown_fields)?;
        Ok(Self {
            bundle,
            builder,
            thresholds,
        })
    }

    /// Engine with the built-in schema and default thresholds.
    pub fn with_defaults(bundle: Arc<ArtifactBundle>) -> Result<Self> {
        Self::new(bundle, &FeatureSchema::default(), TriageThresholds::default(), true)
    }

    pub fn from_config(bundle: Arc<ArtifactBundle>, config: &EngineConfig) -> Result<Self> {
        Self::new(
            bundle,
            &config.schema()?,
            config.triage,
            config.features.reject_unknown_fields,
        )
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn thresholds(&self) -> TriageThresholds {
        self.thresholds
    }

    pub fn build_vector(&self, observation: &ClinicalObservation) -> Result<CanonicalFeatureVector> {
        self.builder.build(observation)
    }

    /// Full attribution detail for one observation.
    pub fn explain(&self, observation: &ClinicalObservation) -> Result<Explanation> {
        let vector = self.builder.build(observation)?;
        let scored = score(&self.bundle, &vector)?;
        Ok(explain(
            self.bundle.classifier(),
            self.bundle.strategy(),
            self.bundle.baseline(),
            &scored.scaled,
        ))
    }

    /// Score, bucket and explain one observation.
    pub fn assess(&self, observation: &ClinicalObservation) -> Result<RiskAssessment> {
        let vector = self.builder.build(observation)?;
        let scored = score(&self.bundle, &vector)?;
        let status = self.thresholds.classify(scored.probability);
        let explanation = explain(
            self.bundle.classifier(),
            self.bundle.strategy(),
            self.bundle.baseline(),
            &scored.scaled,
        );

        let contributing_factors = self
            .bundle
            .feature_order()
            .iter()
            .cloned()
            .zip(explanation.attributions)
            .collect();

        let assessment = RiskAssessment {
            risk_score: to_risk_score(scored.probability),
            status,
            contributing_factors,
            explanation_unavailable: explanation.unavailable,
        };
        debug!(
            status = %assessment.status,
            risk_score = assessment.risk_score,
            "assessment complete"
        );
        Ok(assessment)
    }
}

//! End-to-end assessments against the shipped diabetes-risk bundle.

use clinrisk_core::{
    reference, ArtifactBundle, ArtifactPaths, Classifier, ClinicalObservation, FeatureSchema,
    LogisticModel, RiskEngine, RiskError, Scaler, ScalerKind, TriageStatus, TriageThresholds,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn shipped_models() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

fn engine() -> RiskEngine {
    let bundle = ArtifactBundle::load(shipped_models(), &ArtifactPaths::default())
        .expect("shipped bundle loads");
    RiskEngine::with_defaults(Arc::new(bundle)).unwrap()
}

fn observation(value: serde_json::Value) -> ClinicalObservation {
    serde_json::from_value(value).unwrap()
}

#[test]
fn shipped_bundle_matches_reference_parameters() {
    let shipped = ArtifactBundle::load(shipped_models(), &ArtifactPaths::default()).unwrap();
    let reference = reference::linear_bundle().unwrap();
    assert_eq!(shipped.fingerprint(), reference.fingerprint());
}

#[test]
fn elevated_glucose_is_high_risk() {
    let obs = observation(json!({"glucose": 180, "bp": 90, "bmi": 32, "age": 45}));
    let assessment = engine().assess(&obs).unwrap();

    assert_eq!(assessment.status, TriageStatus::High);
    assert!(
        (70.0..75.0).contains(&assessment.risk_score),
        "unexpected score {}",
        assessment.risk_score
    );
    assert!(!assessment.explanation_unavailable);

    let glucose = assessment.contributing_factors["Glucose"];
    assert!(glucose > 0.0);
    for (name, value) in &assessment.contributing_factors {
        if name != "Glucose" {
            assert!(glucose > value.abs(), "{name} outweighs Glucose");
        }
    }
}

#[test]
fn optional_features_are_imputed() {
    let obs = observation(json!({"Glucose": 100, "BloodPressure": 70, "BMI": 25, "Age": 30}));
    let engine = engine();
    let vector = engine.build_vector(&obs).unwrap();
    assert_eq!(
        vector.as_slice(),
        &[3.0, 100.0, 70.0, 23.0, 30.5, 25.0, 0.3725, 30.0]
    );

    let assessment = engine.assess(&obs).unwrap();
    assert_eq!(assessment.contributing_factors.len(), 8);
    assert!(assessment.contributing_factors.contains_key("Insulin"));
}

#[test]
fn missing_required_feature_is_named() {
    let obs = observation(json!({"bp": 80, "bmi": 28, "age": 50}));
    let err = engine().assess(&obs).unwrap_err();
    assert!(matches!(err, RiskError::MissingRequiredField { ref field } if field == "Glucose"));
    assert!(err.is_client_error());
    assert_eq!(err.report().field.as_deref(), Some("Glucose"));
}

#[test]
fn null_is_treated_as_absent() {
    let with_null = observation(json!({"glucose": 120, "bp": 72, "bmi": 30, "age": 40, "insulin": null}));
    let without = observation(json!({"glucose": 120, "bp": 72, "bmi": 30, "age": 40}));
    let engine = engine();
    assert_eq!(engine.assess(&with_null).unwrap(), engine.assess(&without).unwrap());
}

#[test]
fn aliases_resolve_to_the_same_assessment() {
    let canonical = observation(json!({
        "Glucose": 150, "BloodPressure": 85, "BMI": 34.5, "Age": 52, "Insulin": 120
    }));
    let aliased = observation(json!({
        "glu": "150", "blood_pressure": 85, "bmi": 34.5, "AGE": 52, "ins": 120.0
    }));
    let engine = engine();
    assert_eq!(engine.assess(&canonical).unwrap(), engine.assess(&aliased).unwrap());
}

#[test]
fn conflicting_aliases_are_rejected() {
    let obs = observation(json!({"glucose": 150, "glu": 151, "bp": 85, "bmi": 30, "age": 50}));
    let err = engine().assess(&obs).unwrap_err();
    assert!(matches!(err, RiskError::InvalidValue { ref field, .. } if field == "Glucose"));
}

#[test]
fn malformed_values_are_rejected() {
    let engine = engine();
    for bad in [json!("high"), json!(true), json!([1, 2]), json!(-5), json!(400)] {
        let obs = observation(json!({"glucose": bad, "bp": 85, "bmi": 30, "age": 50}));
        let err = engine.assess(&obs).unwrap_err();
        assert_eq!(err.kind(), "invalid_value", "accepted {obs:?}");
    }
}

#[test]
fn unknown_fields_follow_policy() {
    let obs = observation(json!({"glucose": 150, "bp": 85, "bmi": 30, "age": 50, "cholesterol": 200}));

    let strict = engine();
    let err = strict.assess(&obs).unwrap_err();
    assert!(matches!(err, RiskError::UnknownField { ref field } if field == "cholesterol"));

    let lenient = RiskEngine::new(
        Arc::new(strict.bundle().clone()),
        &FeatureSchema::default(),
        TriageThresholds::default(),
        false,
    )
    .unwrap();
    assert!(lenient.assess(&obs).is_ok());
}

#[test]
fn repeated_assessments_are_bit_identical() {
    let obs = observation(json!({"glucose": 133, "bp": 77, "bmi": 29.4, "age": 38}));
    let engine = engine();
    let first = serde_json::to_vec(&engine.assess(&obs).unwrap()).unwrap();
    for _ in 0..100 {
        assert_eq!(serde_json::to_vec(&engine.assess(&obs).unwrap()).unwrap(), first);
    }
}

#[test]
fn risk_is_monotone_in_glucose() {
    let engine = engine();
    let mut previous = f64::NEG_INFINITY;
    for glucose in (60..=260).step_by(10) {
        let obs = observation(json!({"glucose": glucose, "bp": 72, "bmi": 30, "age": 40}));
        let score = engine.assess(&obs).unwrap().risk_score;
        assert!(score >= previous, "score dropped at glucose {glucose}");
        previous = score;
    }
}

#[test]
fn stricter_thresholds_change_only_the_bucket() {
    let obs = observation(json!({"glucose": 180, "bp": 90, "bmi": 32, "age": 45}));
    let default_engine = engine();
    let strict = RiskEngine::new(
        Arc::new(default_engine.bundle().clone()),
        &FeatureSchema::default(),
        TriageThresholds::new(0.5, 0.9).unwrap(),
        true,
    )
    .unwrap();

    let a = default_engine.assess(&obs).unwrap();
    let b = strict.assess(&obs).unwrap();
    assert_eq!(a.risk_score, b.risk_score);
    assert_eq!(a.contributing_factors, b.contributing_factors);
    assert_eq!(b.status, TriageStatus::Moderate);
}

/// Reference parameters under the column names the training script writes.
fn trainer_named_engine() -> RiskEngine {
    let order: Vec<String> = reference::FEATURE_ORDER
        .iter()
        .map(|name| match *name {
            "DiabetesPedigreeFunction" => "DiabetesPedigree".to_string(),
            other => other.to_string(),
        })
        .collect();
    let bundle = ArtifactBundle::from_parts(
        order,
        Scaler::new(
            ScalerKind::Standard,
            reference::SCALER_CENTER.to_vec(),
            reference::SCALER_SCALE.to_vec(),
        ),
        Classifier::Logistic(LogisticModel::new(
            reference::COEFFICIENTS.to_vec(),
            reference::INTERCEPT,
        )),
    )
    .unwrap();
    RiskEngine::with_defaults(Arc::new(bundle)).unwrap()
}

#[test]
fn trainer_feature_names_pick_up_schema_rules() {
    let trainer_named = trainer_named_engine();
    let shipped = engine();

    let obs = observation(json!({"glucose": 180, "bp": 90, "bmi": 32, "age": 45}));
    assert_eq!(trainer_named.build_vector(&obs).unwrap().as_slice()[6], 0.3725);

    let a = trainer_named.assess(&obs).unwrap();
    let b = shipped.assess(&obs).unwrap();
    assert_eq!(a.risk_score, b.risk_score);
    assert_eq!(
        a.contributing_factors["DiabetesPedigree"],
        b.contributing_factors["DiabetesPedigreeFunction"]
    );

    let obs = observation(json!({"glucose": 180, "bp": 90, "bmi": 32, "age": 45, "dpf": 0.5}));
    assert_eq!(trainer_named.build_vector(&obs).unwrap().as_slice()[6], 0.5);

    let obs = observation(json!({"glucose": 180, "bp": 90, "bmi": 32, "age": 45, "pedigree": 4.0}));
    let err = trainer_named.assess(&obs).unwrap_err();
    assert!(matches!(err, RiskError::InvalidValue { ref field, .. } if field == "DiabetesPedigree"));
}

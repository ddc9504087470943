//! One engine shared across threads.

use clinrisk_core::{reference, ClinicalObservation, RiskAssessment, RiskEngine};
use std::sync::Arc;
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn engine_and_bundle_are_thread_safe() {
    assert_send_sync::<RiskEngine>();
    assert_send_sync::<clinrisk_core::ArtifactBundle>();
    assert_send_sync::<clinrisk_core::BundleLoader>();
}

fn observation(i: usize) -> ClinicalObservation {
    ClinicalObservation::new()
        .with("glucose", 80.0 + (i % 12) as f64 * 15.0)
        .with("bp", 60.0 + (i % 5) as f64 * 8.0)
        .with("bmi", 22.0 + (i % 7) as f64 * 3.0)
        .with("age", 25.0 + (i % 9) as f64 * 6.0)
}

#[test]
fn concurrent_assessments_match_sequential_ones() {
    for bundle in [
        reference::linear_bundle().unwrap(),
        reference::forest_bundle(true).unwrap(),
    ] {
        let engine = Arc::new(RiskEngine::with_defaults(Arc::new(bundle)).unwrap());
        let expected: Vec<RiskAssessment> = (0..64)
            .map(|i| engine.assess(&observation(i)).unwrap())
            .collect();
        let expected = Arc::new(expected);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                let expected = Arc::clone(&expected);
                thread::spawn(move || {
                    for round in 0..16 {
                        let i = (t * 16 + round) % 64;
                        let got = engine.assess(&observation(i)).unwrap();
                        assert_eq!(got, expected[i]);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}

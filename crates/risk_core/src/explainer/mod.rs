//! Additive feature attribution
//!
//! For every supported classifier family the explainer produces one signed
//! value per canonical feature such that
//! `baseline + Σ attributions == raw model output`. Positive values push
//! toward higher risk. The strategy is picked once, when the bundle loads.

pub mod tree_path;

use crate::classifier::{Classifier, OutputUnits};
use serde::{Deserialize, Serialize};

/// Attribution method bound to a loaded classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExplanationStrategy {
    /// Exact `coef_i × (x_i − mean_i)` decomposition
    Linear,
    /// Exact path-dependent Shapley values over the ensemble's trees
    TreePath,
    /// No supported method; attributions are zero and flagged
    Unavailable { reason: String },
}

impl ExplanationStrategy {
    pub fn select(classifier: &Classifier) -> Self {
        match classifier {
            Classifier::Logistic(_) => Self::Linear,
            Classifier::TreeEnsemble(m) if m.has_covers() => Self::TreePath,
            Classifier::TreeEnsemble(_) => Self::Unavailable {
                reason: "tree ensemble carries no node cover statistics".to_string(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }

    /// Expected raw output over the training population.
    pub fn baseline(&self, classifier: &Classifier) -> Option<f64> {
        match (self, classifier) {
            (Self::Linear, Classifier::Logistic(m)) => Some(m.expected_margin()),
            (Self::TreePath, Classifier::TreeEnsemble(m)) => Some(m.expected_output()),
            _ => None,
        }
    }
}

/// Attribution of one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// One value per canonical feature, in canonical order
    pub attributions: Vec<f64>,
    /// Expected raw output; zero when unavailable
    pub baseline: f64,
    /// Raw model output the attributions decompose
    pub raw_output: f64,
    pub units: OutputUnits,
    pub unavailable: bool,
}

impl Explanation {
    /// `baseline + Σ attributions`
    pub fn reconstructed(&self) -> f64 {
        self.attributions.iter().fold(self.baseline, |acc, a| acc + a)
    }
}

/// Explain a scaled vector under the bundle's pre-selected strategy.
pub fn explain(
    classifier: &Classifier,
    strategy: &ExplanationStrategy,
    baseline: f64,
    scaled: &[f64],
) -> Explanation {
    let raw_output = classifier.raw_output(scaled);
    let units = classifier.output_units();
    let mut attributions = vec![0.0; scaled.len()];

    match (strategy, classifier) {
        (ExplanationStrategy::Linear, Classifier::Logistic(m)) => {
            for (i, (c, x)) in m.coefficients.iter().zip(scaled).enumerate() {
                attributions[i] = c * (x - m.mean(i));
            }
        }
        (ExplanationStrategy::TreePath, Classifier::TreeEnsemble(m)) => {
            for (t, tree) in m.trees.iter().enumerate() {
                tree_path::accumulate(tree, scaled, m.tree_factor(t), &mut attributions);
            }
        }
        _ => {
            return Explanation {
                attributions,
                baseline: 0.0,
                raw_output,
                units,
                unavailable: true,
            };
        }
    }

    Explanation {
        attributions,
        baseline,
        raw_output,
        units,
        unavailable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Aggregation, LogisticModel, Node, Tree, TreeEnsemble};

    fn covered_forest() -> Classifier {
        let t1 = Tree::new(
            vec![
                Node::internal(0, 0, 0.0, 1, 2).with_cover(10.0),
                Node::internal(1, 1, 0.0, 3, 4).with_cover(6.0),
                Node::leaf(2, 0.8).with_cover(4.0),
                Node::leaf(3, 0.1).with_cover(3.0),
                Node::leaf(4, 0.5).with_cover(3.0),
            ],
            1.0,
        );
        let t2 = Tree::new(
            vec![
                Node::internal(0, 2, 0.3, 1, 2).with_cover(10.0),
                Node::leaf(1, 0.2).with_cover(7.0),
                Node::leaf(2, 0.9).with_cover(3.0),
            ],
            1.0,
        );
        Classifier::TreeEnsemble(TreeEnsemble::new(3, Aggregation::Mean, vec![t1, t2]))
    }

    #[test]
    fn linear_attributions_are_exact() {
        let clf = Classifier::Logistic(LogisticModel::new(vec![1.5, -0.5, 0.0], -0.2));
        let strategy = ExplanationStrategy::select(&clf);
        assert_eq!(strategy, ExplanationStrategy::Linear);
        let baseline = strategy.baseline(&clf).unwrap();

        let x = [2.0, 1.0, 5.0];
        let e = explain(&clf, &strategy, baseline, &x);
        assert_eq!(e.attributions, vec![3.0, -0.5, 0.0]);
        assert!((e.reconstructed() - clf.raw_output(&x)).abs() < 1e-12);
        assert_eq!(e.units, OutputUnits::LogOdds);
    }

    #[test]
    fn linear_attributions_center_on_population_means() {
        let model = LogisticModel::new(vec![2.0, 1.0], 0.3).with_feature_means(vec![0.5, -1.0]);
        let clf = Classifier::Logistic(model);
        let strategy = ExplanationStrategy::select(&clf);
        let baseline = strategy.baseline(&clf).unwrap();
        let e = explain(&clf, &strategy, baseline, &[0.5, -1.0]);
        assert_eq!(e.attributions, vec![0.0, 0.0]);
        assert!((e.reconstructed() - clf.raw_output(&[0.5, -1.0])).abs() < 1e-12);
    }

    #[test]
    fn forest_attributions_reconstruct_probability() {
        let clf = covered_forest();
        let strategy = ExplanationStrategy::select(&clf);
        assert_eq!(strategy, ExplanationStrategy::TreePath);
        let baseline = strategy.baseline(&clf).unwrap();

        for x in [[-1.0, -1.0, 0.0], [-1.0, 1.0, 1.0], [1.0, 0.0, 0.3], [2.0, -2.0, 0.31]] {
            let e = explain(&clf, &strategy, baseline, &x);
            assert!(!e.unavailable);
            assert_eq!(e.units, OutputUnits::Probability);
            assert!((e.reconstructed() - clf.raw_output(&x)).abs() < 1e-9, "{x:?}");
        }
    }

    #[test]
    fn uncovered_trees_fail_closed() {
        let tree = Tree::new(
            vec![Node::internal(0, 0, 0.0, 1, 2), Node::leaf(1, 0.0), Node::leaf(2, 1.0)],
            1.0,
        );
        let clf = Classifier::TreeEnsemble(TreeEnsemble::new(2, Aggregation::Mean, vec![tree]));
        let strategy = ExplanationStrategy::select(&clf);
        assert!(!strategy.is_available());
        assert_eq!(strategy.baseline(&clf), None);

        let e = explain(&clf, &strategy, 0.0, &[1.0, 1.0]);
        assert!(e.unavailable);
        assert_eq!(e.attributions, vec![0.0, 0.0]);
        assert_eq!(e.raw_output, 1.0);
    }
}

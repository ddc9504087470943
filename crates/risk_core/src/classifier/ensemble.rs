//! Tree ensemble classifier
//!
//! Covers bagged forests, whose leaves hold class-1 probabilities that are
//! averaged, and boosted ensembles, whose leaves hold log-odds increments.

use super::tree::Tree;
use serde::{Deserialize, Serialize};

/// How per-tree outputs combine into the ensemble output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Weighted mean of leaf probabilities
    Mean,
    /// `base_score + Σ weight·leaf`, a log-odds
    LogitSum,
    /// Leaves hold hard 0/1 labels
    Vote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Expected input width
    pub n_features: usize,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn new(n_features: usize, aggregation: Aggregation, trees: Vec<Tree>) -> Self {
        Self {
            n_features,
            aggregation,
            base_score: 0.0,
            trees,
        }
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if !self.base_score.is_finite() {
            return Err("base_score must be finite".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("Tree {i} validation failed: {e}"))?;
        }
        if self.aggregation == Aggregation::Mean {
            if self.trees.iter().any(|t| t.weight <= 0.0) {
                return Err("mean aggregation requires positive tree weights".to_string());
            }
            let out_of_range = self
                .trees
                .iter()
                .flat_map(|t| t.nodes.iter())
                .filter_map(|n| n.leaf)
                .any(|v| !(0.0..=1.0).contains(&v));
            if out_of_range {
                return Err("mean aggregation requires leaf probabilities in [0, 1]".to_string());
            }
        }
        Ok(())
    }

    /// Normalized contribution of tree `t` to the ensemble output.
    pub fn tree_factor(&self, t: usize) -> f64 {
        match self.aggregation {
            Aggregation::Mean => self.trees[t].weight / self.total_weight(),
            Aggregation::LogitSum | Aggregation::Vote => self.trees[t].weight,
        }
    }

    fn total_weight(&self) -> f64 {
        self.trees.iter().map(|t| t.weight).sum()
    }

    fn offset(&self) -> f64 {
        match self.aggregation {
            Aggregation::Mean => 0.0,
            Aggregation::LogitSum | Aggregation::Vote => self.base_score,
        }
    }

    /// Ensemble output before any link function.
    pub fn raw_output(&self, scaled: &[f64]) -> f64 {
        self.trees
            .iter()
            .enumerate()
            .fold(self.offset(), |acc, (t, tree)| {
                acc + self.tree_factor(t) * tree.evaluate(scaled)
            })
    }

    pub fn has_covers(&self) -> bool {
        self.trees.iter().all(Tree::has_covers)
    }

    /// Cover-weighted expected raw output over the training population.
    pub fn expected_output(&self) -> f64 {
        self.trees
            .iter()
            .enumerate()
            .fold(self.offset(), |acc, (t, tree)| {
                acc + self.tree_factor(t) * tree.expected_value()
            })
    }
}

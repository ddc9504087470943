//! Decision tree structures for ensemble inference
//!
//! Nodes use `-1` sentinels for leaves, the layout most tree exporters emit.
//! Each node may carry the training cover (samples routed through it), which
//! the path-based explainer needs.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the scaled feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` holds the prediction value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (for reference, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split threshold in scaled feature space
    #[serde(default)]
    pub threshold: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    #[serde(default)]
    pub leaf: Option<f64>,

    /// Training samples (or hessian weight) routed through this node
    #[serde(default)]
    pub cover: f64,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
            cover: 0.0,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
            cover: 0.0,
        }
    }

    pub fn with_cover(mut self, cover: f64) -> Self {
        self.cover = cover;
        self
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    /// Get the leaf value if this is a leaf node
    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }
}

/// A single decision tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Tree weight for ensemble aggregation
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Index of the child `features` routes to from internal node `idx`.
    ///
    /// Goes left when `feature <= threshold`.
    pub fn next_child(&self, idx: usize, features: &[f64]) -> usize {
        let node = &self.nodes[idx];
        let value = features[node.feature_idx as usize];
        if value <= node.threshold {
            node.left as usize
        } else {
            node.right as usize
        }
    }

    /// Evaluate this tree on a scaled feature vector
    ///
    /// Assumes the tree passed [`Tree::validate`] for `features.len()`.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0.0);
            }
            idx = self.next_child(idx, features);
        }
    }

    /// Get the root node
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// True when every node carries a positive, finite cover.
    pub fn has_covers(&self) -> bool {
        !self.nodes.is_empty()
            && self
                .nodes
                .iter()
                .all(|n| n.cover.is_finite() && n.cover > 0.0)
    }

    /// Cover-weighted mean output: the prediction with no feature known.
    ///
    /// Only meaningful when [`Tree::has_covers`] holds.
    pub fn expected_value(&self) -> f64 {
        self.expected_from(0)
    }

    fn expected_from(&self, idx: usize) -> f64 {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return node.leaf_value().unwrap_or(0.0);
        }
        let left = node.left as usize;
        let right = node.right as usize;
        (self.nodes[left].cover * self.expected_from(left)
            + self.nodes[right].cover * self.expected_from(right))
            / node.cover
    }

    /// Validate tree structure against the expected input width
    ///
    /// Children must point forward, which rules out cycles.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err(format!("Tree weight {} is not finite", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("Leaf node {i} has non-finite value {v}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("Node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= n_features {
                return Err(format!(
                    "Internal node {} has invalid feature index: {} (width {})",
                    i, node.feature_idx, n_features
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Internal node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2).with_cover(100.0),
                Node::leaf(1, 0.2).with_cover(75.0),
                Node::leaf(2, 0.8).with_cover(25.0),
            ],
            1.0,
        )
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 1.25, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -0.75);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-0.75));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0.1]), 0.2);
        assert_eq!(tree.evaluate(&[0.5]), 0.2); // Equal goes left
        assert_eq!(tree.evaluate(&[0.9]), 0.8);
    }

    #[test]
    fn expected_value_is_cover_weighted() {
        let tree = stump();
        assert!(tree.has_covers());
        assert!((tree.expected_value() - (0.75 * 0.2 + 0.25 * 0.8)).abs() < 1e-12);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1).is_ok());

        // feature index outside the input width
        assert!(stump().validate(0).is_err());

        // child pointing backwards would loop forever
        let cyclic = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::internal(1, 0, 0.1, 0, 2),
                Node::leaf(2, 1.0),
            ],
            1.0,
        );
        assert!(cyclic.validate(1).is_err());

        let out_of_bounds = Tree::new(
            vec![Node::internal(0, 0, 0.5, 5, 2), Node::leaf(1, 0.0), Node::leaf(2, 1.0)],
            1.0,
        );
        assert!(out_of_bounds.validate(1).is_err());
    }

    #[test]
    fn missing_covers_are_detected() {
        let tree = Tree::new(
            vec![Node::internal(0, 0, 0.5, 1, 2), Node::leaf(1, 0.0), Node::leaf(2, 1.0)],
            1.0,
        );
        assert!(!tree.has_covers());
    }

    #[test]
    fn deserializes_exported_nodes() {
        let json = r#"{"nodes":[
            {"id":0,"left":1,"right":2,"feature":0,"threshold":0.5,"leaf":null,"cover":10},
            {"id":1,"left":-1,"right":-1,"feature":-1,"leaf":0.1,"cover":4},
            {"id":2,"left":-1,"right":-1,"feature":-1,"leaf":0.9,"cover":6}
        ]}"#;
        let tree: Tree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.weight, 1.0);
        assert!(tree.validate(1).is_ok());
        assert_eq!(tree.evaluate(&[0.7]), 0.9);
    }
}

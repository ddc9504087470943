//! Exact path-dependent Shapley values for decision trees
//!
//! Walks every root-to-leaf path once, tracking for each feature on the path
//! the fraction of training cover that flows down the path when the feature
//! is unknown (`zero_fraction`) and whether the explained sample follows the
//! path when the feature is known (`one_fraction`). The permutation weights
//! of all feature subsets are maintained incrementally, so the cost is
//! polynomial in depth instead of exponential in the number of features.
//!
//! For every tree, `expected_value() + Σ phi == evaluate(x)`.

use crate::classifier::Tree;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

/// Add one tree's attributions for `x`, scaled by `factor`, into `phi`.
///
/// Requires a validated tree with positive covers.
pub fn accumulate(tree: &Tree, x: &[f64], factor: f64, phi: &mut [f64]) {
    let mut ctx = Walk {
        tree,
        x,
        factor,
        phi,
    };
    ctx.recurse(0, Vec::with_capacity(16), 1.0, 1.0, None);
}

struct Walk<'a> {
    tree: &'a Tree,
    x: &'a [f64],
    factor: f64,
    phi: &'a mut [f64],
}

impl Walk<'_> {
    fn recurse(
        &mut self,
        idx: usize,
        mut path: Vec<PathElement>,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        extend(&mut path, zero_fraction, one_fraction, feature);
        let node = &self.tree.nodes[idx];

        if node.is_leaf() {
            let value = node.leaf_value().unwrap_or(0.0) * self.factor;
            for i in 1..path.len() {
                let el = path[i];
                if let Some(f) = el.feature {
                    let w = unwound_sum(&path, i);
                    self.phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
                }
            }
            return;
        }

        let split = node.feature_idx as usize;
        let hot = self.tree.next_child(idx, self.x);
        let cold = if hot == node.left as usize {
            node.right as usize
        } else {
            node.left as usize
        };
        let hot_zero = self.tree.nodes[hot].cover / node.cover;
        let cold_zero = self.tree.nodes[cold].cover / node.cover;

        // A feature seen earlier on this path is folded into the new split.
        let mut incoming_zero = 1.0;
        let mut incoming_one = 1.0;
        if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
            incoming_zero = path[k].zero_fraction;
            incoming_one = path[k].one_fraction;
            unwind(&mut path, k);
        }

        self.recurse(
            hot,
            path.clone(),
            hot_zero * incoming_zero,
            incoming_one,
            Some(split),
        );
        self.recurse(cold, path, cold_zero * incoming_zero, 0.0, Some(split));
    }
}

fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let d = depth as f64;
    for i in (0..depth).rev() {
        let fi = i as f64;
        path[i + 1].pweight += one_fraction * path[i].pweight * (fi + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - fi) / (d + 1.0);
    }
}

fn unwind(path: &mut Vec<PathElement>, k: usize) {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[k].one_fraction;
    let zero_fraction = path[k].zero_fraction;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - fi) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - fi));
        }
    }

    for i in k..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

fn unwound_sum(path: &[PathElement], k: usize) -> f64 {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[k].one_fraction;
    let zero_fraction = path[k].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (d - fi) / (d + 1.0);
        } else if zero_fraction != 0.0 {
            total += path[i].pweight / zero_fraction / ((d - fi) / (d + 1.0));
        }
    }
    total
}

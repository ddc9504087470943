//! Fitted per-feature affine scaler

use serde::{Deserialize, Serialize};

/// How the scaler was fitted. Both apply `(x - center) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Mean / standard deviation
    Standard,
    /// Median / interquartile range
    Robust,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub kind: ScalerKind,
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn new(kind: ScalerKind, center: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { kind, center, scale }
    }

    /// Number of features the scaler was fitted on
    pub fn width(&self) -> usize {
        self.center.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.center.len() != self.scale.len() {
            return Err(format!(
                "scaler has {} centers but {} scales",
                self.center.len(),
                self.scale.len()
            ));
        }
        for (i, (c, s)) in self.center.iter().zip(&self.scale).enumerate() {
            if !c.is_finite() {
                return Err(format!("scaler center {i} is not finite"));
            }
            if !s.is_finite() || *s == 0.0 {
                return Err(format!("scaler scale {i} must be finite and non-zero, got {s}"));
            }
        }
        Ok(())
    }

    /// Apply the stored transform elementwise.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(x, (c, s))| (x - c) / s)
            .collect()
    }
}

//! Linear (logistic) classifier

use serde::{Deserialize, Serialize};

/// Output link of a linear model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    /// Margin is a log-odds; the sigmoid yields a probability
    #[default]
    Logistic,
    /// Raw decision margin with no probabilistic meaning
    Identity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Expected input width
    pub n_features: usize,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Training-population means in scaled space; zeros when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_means: Option<Vec<f64>>,
    #[serde(default)]
    pub link: Link,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            n_features: coefficients.len(),
            coefficients,
            intercept,
            feature_means: None,
            link: Link::Logistic,
        }
    }

    pub fn with_feature_means(mut self, means: Vec<f64>) -> Self {
        self.feature_means = Some(means);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != self.n_features {
            return Err(format!(
                "model declares {} features but has {} coefficients",
                self.n_features,
                self.coefficients.len()
            ));
        }
        if let Some(means) = &self.feature_means {
            if means.len() != self.n_features {
                return Err(format!(
                    "model declares {} features but has {} feature means",
                    self.n_features,
                    means.len()
                ));
            }
        }
        let all = self
            .coefficients
            .iter()
            .chain(self.feature_means.iter().flatten())
            .chain(std::iter::once(&self.intercept));
        if all.into_iter().any(|v| !v.is_finite()) {
            return Err("model parameters must be finite".to_string());
        }
        Ok(())
    }

    /// Decision margin `intercept + Σ coef·x`.
    pub fn margin(&self, scaled: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(scaled)
            .fold(self.intercept, |acc, (c, x)| acc + c * x)
    }

    pub fn mean(&self, i: usize) -> f64 {
        self.feature_means.as_ref().map_or(0.0, |m| m[i])
    }

    /// Margin at the population mean.
    pub fn expected_margin(&self) -> f64 {
        (0..self.n_features).fold(self.intercept, |acc, i| {
            acc + self.coefficients[i] * self.mean(i)
        })
    }
}

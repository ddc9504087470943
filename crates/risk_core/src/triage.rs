//! Probability → triage bucket

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TriageStatus {
    Stable,
    Moderate,
    High,
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stable => "Stable",
            Self::Moderate => "Moderate",
            Self::High => "High",
        };
        f.write_str(s)
    }
}

pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.6;

/// Two-threshold bucketing policy
///
/// Upper bounds are inclusive: `p == moderate_threshold` is Stable and
/// `p == high_threshold` is Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageThresholds {
    pub moderate_threshold: f64,
    pub high_threshold: f64,
}

impl Default for TriageThresholds {
    fn default() -> Self {
        Self {
            moderate_threshold: DEFAULT_MODERATE_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl TriageThresholds {
    pub fn new(moderate_threshold: f64, high_threshold: f64) -> Result<Self, String> {
        let thresholds = Self {
            moderate_threshold,
            high_threshold,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), String> {
        let ordered = 0.0 <= self.moderate_threshold
            && self.moderate_threshold < self.high_threshold
            && self.high_threshold <= 1.0;
        if !ordered {
            return Err(format!(
                "thresholds must satisfy 0 <= moderate < high <= 1, got moderate={} high={}",
                self.moderate_threshold, self.high_threshold
            ));
        }
        Ok(())
    }

    pub fn classify(&self, probability: f64) -> TriageStatus {
        if probability > self.high_threshold {
            TriageStatus::High
        } else if probability > self.moderate_threshold {
            TriageStatus::Moderate
        } else {
            TriageStatus::Stable
        }
    }
}

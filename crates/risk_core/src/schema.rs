//! Canonical feature schema
//!
//! One versioned table of canonical clinical features: their aliases, the
//! imputation default used when a caller omits them, and the sanity range a
//! supplied value must fall within. The bundle's feature order decides which
//! features a vector contains; the schema decides how each one is resolved.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the built-in schema
pub const SCHEMA_VERSION: u32 = 1;

/// Resolution rules for a single canonical feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Canonical name as used in the bundle's feature order
    pub name: String,
    /// Accepted shorthands, matched after normalization
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Imputation default; `None` makes the feature required
    #[serde(default)]
    pub default: Option<f64>,
    /// Inclusive lower sanity bound
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper sanity bound
    #[serde(default)]
    pub max: Option<f64>,
}

impl FeatureSpec {
    pub fn new(name: &str, aliases: &[&str], default: Option<f64>, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            default,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Spec for a feature the schema has no entry for: exact name only.
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            default: None,
            min: None,
            max: None,
        }
    }

    /// Check a value against the sanity range.
    pub fn check_range(&self, value: f64) -> Result<(), String> {
        let below = self.min.map_or(false, |min| value < min);
        let above = self.max.map_or(false, |max| value > max);
        if below || above {
            return Err(format!(
                "{} is outside the accepted range [{}, {}]",
                value,
                self.min.map_or_else(|| "-inf".to_string(), |v| v.to_string()),
                self.max.map_or_else(|| "inf".to_string(), |v| v.to_string()),
            ));
        }
        Ok(())
    }
}

/// Normalize a caller-supplied key for alias lookup.
///
/// Lower-cases and drops `_`, `-` and whitespace.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Versioned alias/default/range table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub features: Vec<FeatureSpec>,
}

impl Default for FeatureSchema {
    /// Eight-feature diabetes-risk schema. Defaults are training-population
    /// medians; Glucose, BloodPressure, BMI and Age carry most of the
    /// attribution weight and are therefore required.
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            features: vec![
                FeatureSpec::new("Pregnancies", &["preg", "pregnancies"], Some(3.0), 0.0, 20.0),
                FeatureSpec::new("Glucose", &["glucose", "glu"], None, 0.0, 300.0),
                FeatureSpec::new("BloodPressure", &["bp", "bloodpressure"], None, 0.0, 200.0),
                FeatureSpec::new("SkinThickness", &["skin", "skinthickness"], Some(23.0), 0.0, 100.0),
                FeatureSpec::new("Insulin", &["insulin", "ins"], Some(30.5), 0.0, 900.0),
                FeatureSpec::new("BMI", &["bmi"], None, 10.0, 70.0),
                FeatureSpec::new(
                    "DiabetesPedigreeFunction",
                    &["dpf", "pedigree", "diabetespedigree", "diabetespedigreefunction"],
                    Some(0.3725),
                    0.0,
                    3.0,
                ),
                FeatureSpec::new("Age", &["age"], None, 0.0, 120.0),
            ],
        }
    }
}

impl FeatureSchema {
    /// Spec governing `name`: an exact name match, otherwise the spec whose
    /// normalized name or alias equals the normalized `name`.
    pub fn spec(&self, name: &str) -> Option<&FeatureSpec> {
        self.position(name).map(|i| &self.features[i])
    }

    pub fn spec_mut(&mut self, name: &str) -> Option<&mut FeatureSpec> {
        self.position(name).map(move |i| &mut self.features[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.features.iter().position(|f| f.name == name) {
            return Some(i);
        }
        let key = normalize_key(name);
        self.features.iter().position(|f| {
            normalize_key(&f.name) == key || f.aliases.iter().any(|a| normalize_key(a) == key)
        })
    }

    /// Build the normalized-key → bundle-name lookup for the given order.
    ///
    /// Every bundle name is reachable through its own normalized form, plus
    /// the name and aliases of the spec that governs it. Names without a
    /// schema entry resolve only through their own form.
    pub fn alias_table(&self, feature_order: &[String]) -> Result<HashMap<String, String>, String> {
        let mut table: HashMap<String, String> = HashMap::new();
        for canonical in feature_order {
            let mut keys = vec![normalize_key(canonical)];
            if let Some(spec) = self.spec(canonical) {
                keys.push(normalize_key(&spec.name));
                keys.extend(spec.aliases.iter().map(|a| normalize_key(a)));
            }
            for key in keys {
                match table.get(&key) {
                    Some(existing) if existing != canonical => {
                        return Err(format!(
                            "alias '{key}' maps to both {existing} and {canonical}"
                        ));
                    }
                    _ => {
                        table.insert(key, canonical.clone());
                    }
                }
            }
        }
        Ok(table)
    }

    /// Resolution rules for the bundle feature `canonical`, named as the
    /// bundle names it; falls back to a bare spec.
    pub fn resolve_spec(&self, canonical: &str) -> FeatureSpec {
        match self.spec(canonical) {
            Some(spec) => FeatureSpec {
                name: canonical.to_string(),
                ..spec.clone()
            },
            None => FeatureSpec::bare(canonical),
        }
    }

    pub fn canonical_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }
}

//! Feature vector construction
//!
//! Turns a partial, aliased clinical observation into a complete vector in
//! the bundle's canonical feature order, imputing documented defaults for
//! anything the caller left out.

use crate::errors::{Result, RiskError};
use crate::schema::{normalize_key, FeatureSchema, FeatureSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Caller-supplied measurements keyed by any accepted alias
///
/// Values may be JSON numbers or numeric strings; `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalObservation(BTreeMap<String, Value>);

impl ClinicalObservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style numeric insert.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), Value::from(value));
    }

    pub fn insert_raw(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ClinicalObservation {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut obs = Self::new();
        for (k, v) in iter {
            obs.insert(k, v);
        }
        obs
    }
}

/// Fixed-length vector in canonical feature order
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFeatureVector {
    values: Vec<f64>,
}

impl CanonicalFeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

/// Maps observations onto one bundle's canonical order
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    feature_order: Vec<String>,
    specs: Vec<FeatureSpec>,
    aliases: HashMap<String, String>,
    positions: HashMap<String, usize>,
    reject_unknown_fields: bool,
}

impl FeatureVectorBuilder {
    pub fn new(
        schema: &FeatureSchema,
        feature_order: &[String],
        reject_unknown_fields: bool,
    ) -> Result<Self> {
        let aliases = schema.alias_table(feature_order).map_err(RiskError::Config)?;
        let specs = feature_order
            .iter()
            .map(|name| schema.resolve_spec(name))
            .collect();
        let positions = feature_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self {
            feature_order: feature_order.to_vec(),
            specs,
            aliases,
            positions,
            reject_unknown_fields,
        })
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    /// Resolve, validate and impute one observation.
    pub fn build(&self, observation: &ClinicalObservation) -> Result<CanonicalFeatureVector> {
        let mut slots: Vec<Option<f64>> = vec![None; self.feature_order.len()];

        for (key, raw) in observation.iter() {
            let Some(canonical) = self.aliases.get(&normalize_key(key)) else {
                if self.reject_unknown_fields {
                    return Err(RiskError::UnknownField { field: key.clone() });
                }
                warn!(field = %key, "ignoring unrecognised observation field");
                continue;
            };
            let idx = self.positions[canonical];
            let spec = &self.specs[idx];

            let Some(value) = parse_value(canonical, raw)? else {
                continue;
            };
            spec.check_range(value)
                .map_err(|reason| RiskError::invalid(canonical, reason))?;

            match slots[idx] {
                Some(previous) if previous.to_bits() != value.to_bits() => {
                    return Err(RiskError::invalid(
                        canonical,
                        format!("conflicting values {previous} and {value} supplied under different aliases"),
                    ));
                }
                _ => slots[idx] = Some(value),
            }
        }

        let values = slots
            .into_iter()
            .zip(&self.specs)
            .map(|(slot, spec)| {
                slot.or(spec.default)
                    .ok_or_else(|| RiskError::missing(&spec.name))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(CanonicalFeatureVector::new(values))
    }
}

fn parse_value(field: &str, raw: &Value) -> Result<Option<f64>> {
    let value = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| RiskError::invalid(field, format!("{n} is not representable as a number")))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RiskError::invalid(field, format!("'{s}' is not numeric")))?,
        other => {
            return Err(RiskError::invalid(
                field,
                format!("expected a number, got {other}"),
            ))
        }
    };

    if !value.is_finite() {
        return Err(RiskError::invalid(field, "value must be finite"));
    }
    Ok(Some(value))
}

//! Error types for the risk-inference core

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading artifacts or assessing an observation
#[derive(Error, Debug)]
pub enum RiskError {
    /// A canonical feature has no supplied value and no configured default
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A supplied value is non-numeric, non-finite or outside its sanity range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The observation names a field that maps to no canonical feature
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// The loaded classifier cannot produce a class probability
    #[error("Uncalibrated model: {0}")]
    UncalibratedModel(String),

    /// The artifact bundle failed to load or validate
    #[error("Artifact load failed: {0}")]
    ArtifactLoad(String),

    /// Engine configuration is malformed or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RiskError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. } | Self::InvalidValue { .. } | Self::UnknownField { .. }
        )
    }

    /// Name of the offending field for request-scoped errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::InvalidValue { field, .. }
            | Self::UnknownField { field } => Some(field),
            _ => None,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::InvalidValue { .. } => "invalid_value",
            Self::UnknownField { .. } => "unknown_field",
            Self::UncalibratedModel(_) => "uncalibrated_model",
            Self::ArtifactLoad(_) => "artifact_load",
            Self::Config(_) => "config",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: self.kind().to_string(),
            field: self.field().map(str::to_string),
            message: self.to_string(),
        }
    }
}

/// Structured error payload handed back to transport layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

/// Result type for risk-core operations
pub type Result<T> = std::result::Result<T, RiskError>;

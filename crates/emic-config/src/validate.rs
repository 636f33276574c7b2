//! Rejection of configurations the engine cannot run.

use thiserror::Error;

use crate::inference::InferenceConfig;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest history the engine accepts; the history tree grows as |A|^L.
pub const MAX_HISTORY_LIMIT: usize = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("cannot read config: {0}")]
    IoError(String),

    #[error("cannot parse config: {0}")]
    ParseError(String),

    #[error("invalid {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("config schema {actual} is not supported (expected {expected})")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Stable code in the configuration range (20-29).
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 20,
            ValidationError::IoError(_) => 21,
            ValidationError::ParseError(_) => 22,
            ValidationError::VersionMismatch { .. } => 23,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Check every field of `config` against the range the engine supports.
pub fn validate_inference(config: &InferenceConfig) -> ValidationResult<()> {
    let depth = config.max_history_length;
    if !(1..=MAX_HISTORY_LIMIT).contains(&depth) {
        return Err(ValidationError::invalid(
            "max_history_length",
            format!("expected 1..={MAX_HISTORY_LIMIT}, got {depth}"),
        ));
    }

    let alpha = config.significance_level;
    // NaN fails both comparisons
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ValidationError::invalid(
            "significance_level",
            format!("expected a value in (0, 1), got {alpha}"),
        ));
    }

    if config.min_count == 0 {
        return Err(ValidationError::invalid("min_count", "expected at least 1, got 0"));
    }

    Ok(())
}

pub fn validate_schema_version(version: &str) -> ValidationResult<()> {
    if version == crate::CONFIG_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: version.to_string(),
        })
    }
}

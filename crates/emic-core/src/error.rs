//! Unified error type for emic.
//!
//! Every module keeps its own `thiserror` enum; [`Error`] wraps them with:
//! - Stable numeric codes for machine parsing
//! - A category for grouping
//! - A recoverability hint (whether different input or settings can succeed)
//!
//! Codes are grouped by category:
//! - 10-19: input (alphabet, sequence, data volume)
//! - 20-29: configuration
//! - 30-39: inference
//! - 40-49: model structure
//! - 50-59: sources
//! - 60-69: serialization

use serde::{Deserialize, Serialize};
use thiserror::Error;

use emic_config::ValidationError;

use crate::alphabet::SequenceError;
use crate::inference::InferenceError;
use crate::model::ModelError;
use crate::source::SourceError;
use crate::tree::InsufficientData;

/// Result type alias for emic operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Alphabet and sequence problems.
    Input,
    Config,
    Inference,
    /// Invalid or unusable causal state models.
    Model,
    Source,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Serialization => write!(f, "serialization"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    InsufficientData(#[from] InsufficientData),

    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Sequence(e) => sequence_code(e),
            Error::InsufficientData(_) => 14,
            Error::Config(e) => e.code(),
            Error::Inference(e) => match e {
                InferenceError::MalformedInput(_) => 13,
                InferenceError::Sequence(e) => sequence_code(e),
                InferenceError::Config(e) => e.code(),
                InferenceError::Model(e) => model_code(e),
            },
            Error::Model(e) => model_code(e),
            Error::Source(e) => match e {
                SourceError::InvalidProbability { .. } => 50,
                SourceError::EmptyPattern => 51,
                SourceError::NonPrimitivePattern { .. } => 52,
                SourceError::ZeroLength => 53,
                SourceError::Model(e) => model_code(e),
                SourceError::Sequence(e) => sequence_code(e),
            },
            Error::Json(_) => 61,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            10..=19 => ErrorCategory::Input,
            20..=29 => ErrorCategory::Config,
            30..=39 => ErrorCategory::Inference,
            40..=49 => ErrorCategory::Model,
            50..=59 => ErrorCategory::Source,
            _ => ErrorCategory::Serialization,
        }
    }

    /// Whether a retry with different input or settings can succeed.
    ///
    /// Structural model errors are not: the model itself has to change.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.code(),
            40 | 41 | 43 // undefined transition, unknown state, invalid model
        )
    }
}

fn sequence_code(e: &SequenceError) -> u32 {
    match e {
        SequenceError::InvalidAlphabet { .. } => 10,
        SequenceError::SymbolOutOfRange { .. } => 11,
        SequenceError::AlphabetMismatch { .. } => 12,
    }
}

fn model_code(e: &ModelError) -> u32 {
    match e {
        ModelError::UndefinedTransition { .. } => 40,
        ModelError::UnknownState(_) => 41,
        ModelError::NoStationaryDistribution { .. } => 42,
        ModelError::InvalidModel(_) => 43,
        ModelError::Serialization(_) => 60,
    }
}

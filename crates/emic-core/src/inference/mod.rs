//! Inference of causal state models from observed sequences.
//!
//! The entry points are [`infer`] and [`infer_symbols`]; [`Cssr`] exposes the
//! same run with a custom [`DistinguishabilityTest`].

mod distinguish;
mod engine;
mod outcome;
mod partition;

pub use distinguish::{test_for, ChiSquaredTest, DistinguishabilityTest, KolmogorovSmirnovTest};
pub use engine::Cssr;
pub use outcome::{
    ConvergenceStatus, Diagnostic, InferenceOutcome, PassSummary, Severity, UnderConvergence,
};

use thiserror::Error;

use emic_config::{InferenceConfig, ValidationError};

use crate::alphabet::{Sequence, SequenceError, Symbol};
use crate::model::ModelError;

/// Errors that stop an inference run before it produces a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid sequence: {0}")]
    Sequence(#[from] SequenceError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("could not assemble model: {0}")]
    Model(#[from] ModelError),
}

/// Infer a causal state model from `sequence`.
///
/// ```
/// use emic_config::InferenceConfig;
/// use emic_core::{infer, Sequence};
///
/// let seq = Sequence::from_symbols(vec![0; 200], 2).unwrap();
/// let outcome = infer(&seq, &InferenceConfig::default()).unwrap();
/// assert_eq!(outcome.model.num_states(), 1);
/// ```
pub fn infer(
    sequence: &Sequence,
    config: &InferenceConfig,
) -> Result<InferenceOutcome, InferenceError> {
    Cssr::new(config)?.run(sequence)
}

/// Infer from raw symbols over an alphabet of `alphabet_size`.
pub fn infer_symbols(
    symbols: &[Symbol],
    alphabet_size: usize,
    config: &InferenceConfig,
) -> Result<InferenceOutcome, InferenceError> {
    if alphabet_size == 0 {
        return Err(InferenceError::MalformedInput(
            "alphabet is empty".to_string(),
        ));
    }
    let sequence = Sequence::from_symbols(symbols.to_vec(), alphabet_size)?;
    infer(&sequence, config)
}

//! Reference processes with known causal structure.
//!
//! Each process is a hand-built [`CausalStateModel`] sampled by
//! [`MachineSource`], so the generator and the closed-form measures describe
//! the same machine.

mod machine;

pub use machine::MachineSource;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use emic_math::binary_entropy;

use crate::alphabet::{Sequence, SequenceError, Symbol, MAX_ALPHABET_SIZE};
use crate::model::{CausalStateModel, ModelError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("parameter p = {p} must lie strictly between 0 and 1")]
    InvalidProbability { p: f64 },

    #[error("periodic pattern is empty")]
    EmptyPattern,

    #[error("periodic pattern {pattern:?} repeats a shorter block of length {period}")]
    NonPrimitivePattern { pattern: Vec<Symbol>, period: usize },

    #[error("requested sequence length is zero")]
    ZeroLength,

    #[error("cannot sample from model: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Parameters of a reference process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "process", rename_all = "snake_case")]
pub enum SourceParams {
    /// No two consecutive 1s.
    GoldenMean { p: f64 },
    /// Runs of 1s have even length.
    EvenProcess { p: f64 },
    /// I.i.d. symbols with P(1) = p.
    BiasedCoin { p: f64 },
    /// A fixed cycle through `pattern`.
    Periodic { pattern: Vec<Symbol> },
}

impl SourceParams {
    pub fn name(&self) -> &'static str {
        match self {
            SourceParams::GoldenMean { .. } => "golden_mean",
            SourceParams::EvenProcess { .. } => "even_process",
            SourceParams::BiasedCoin { .. } => "biased_coin",
            SourceParams::Periodic { .. } => "periodic",
        }
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        match self {
            SourceParams::GoldenMean { p }
            | SourceParams::EvenProcess { p }
            | SourceParams::BiasedCoin { p } => {
                if p.is_finite() && *p > 0.0 && *p < 1.0 {
                    Ok(())
                } else {
                    Err(SourceError::InvalidProbability { p: *p })
                }
            }
            SourceParams::Periodic { pattern } => {
                if pattern.is_empty() {
                    return Err(SourceError::EmptyPattern);
                }
                let period = smallest_period(pattern);
                if period != pattern.len() {
                    return Err(SourceError::NonPrimitivePattern {
                        pattern: pattern.clone(),
                        period,
                    });
                }
                Ok(())
            }
        }
    }

    /// Alphabet size of the emitted sequence.
    pub fn alphabet_size(&self) -> usize {
        match self {
            SourceParams::Periodic { pattern } => pattern
                .iter()
                .map(|&s| s as usize + 1)
                .max()
                .unwrap_or(1)
                .clamp(1, MAX_ALPHABET_SIZE),
            _ => 2,
        }
    }

    /// The minimal unifilar machine of this process.
    pub fn reference_model(&self) -> Result<CausalStateModel, SourceError> {
        self.validate()?;
        let mut b = CausalStateModel::builder(self.alphabet_size())?;
        match self {
            SourceParams::GoldenMean { p } => {
                let a = b.add_state();
                let c = b.add_state();
                b.emit(a, 0, 1.0 - p, a).emit(a, 1, *p, c).emit(c, 0, 1.0, a);
                b.start(a);
            }
            SourceParams::EvenProcess { p } => {
                let a = b.add_state();
                let c = b.add_state();
                b.emit(a, 0, *p, a).emit(a, 1, 1.0 - p, c).emit(c, 1, 1.0, a);
                b.start(a);
            }
            SourceParams::BiasedCoin { p } => {
                let s = b.add_state();
                b.emit(s, 0, 1.0 - p, s).emit(s, 1, *p, s);
                b.start(s);
            }
            SourceParams::Periodic { pattern } => {
                let ids: Vec<_> = pattern.iter().map(|_| b.add_state()).collect();
                for (i, &symbol) in pattern.iter().enumerate() {
                    b.emit(ids[i], symbol, 1.0, ids[(i + 1) % ids.len()]);
                }
                b.start(ids[0]);
            }
        }
        Ok(b.build()?)
    }

    /// hμ in closed form.
    pub fn exact_entropy_rate(&self) -> f64 {
        match self {
            SourceParams::GoldenMean { p } => binary_entropy(*p) / (1.0 + p),
            SourceParams::EvenProcess { p } => binary_entropy(*p) / (2.0 - p),
            SourceParams::BiasedCoin { p } => binary_entropy(*p),
            SourceParams::Periodic { .. } => 0.0,
        }
    }

    /// Cμ in closed form.
    pub fn exact_statistical_complexity(&self) -> f64 {
        match self {
            SourceParams::BiasedCoin { .. } => 0.0,
            SourceParams::Periodic { pattern } => (pattern.len() as f64).log2(),
            _ => emic_math::entropy_bits(&self.exact_stationary_distribution()),
        }
    }

    /// π over the states of [`Self::reference_model`], in state order.
    pub fn exact_stationary_distribution(&self) -> Vec<f64> {
        match self {
            SourceParams::GoldenMean { p } => vec![1.0 / (1.0 + p), p / (1.0 + p)],
            SourceParams::EvenProcess { p } => vec![1.0 / (2.0 - p), (1.0 - p) / (2.0 - p)],
            SourceParams::BiasedCoin { .. } => vec![1.0],
            SourceParams::Periodic { pattern } => {
                let k = pattern.len().max(1);
                vec![1.0 / k as f64; k]
            }
        }
    }
}

/// Sample `length` symbols of the process described by `params`.
pub fn generate(length: usize, seed: u64, params: &SourceParams) -> Result<Sequence, SourceError> {
    let model = params.reference_model()?;
    let sequence = MachineSource::new(&model).generate(length, seed)?;
    tracing::debug!(
        event = crate::logging::event_names::SOURCE_GENERATED,
        stage = %crate::logging::Stage::Source,
        process = params.name(),
        length,
        seed,
        "reference sequence generated"
    );
    Ok(sequence)
}

// Length of the shortest block whose repetition yields `pattern`.
fn smallest_period(pattern: &[Symbol]) -> usize {
    let n = pattern.len();
    (1..=n)
        .find(|&d| n % d == 0 && (d..n).all(|i| pattern[i] == pattern[i - d]))
        .unwrap_or(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn invalid_parameters_are_rejected() {
        for p in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                SourceParams::GoldenMean { p }.validate(),
                Err(SourceError::InvalidProbability { .. })
            ));
        }
        assert_eq!(
            SourceParams::Periodic { pattern: vec![] }.validate(),
            Err(SourceError::EmptyPattern)
        );
        assert!(matches!(
            SourceParams::Periodic { pattern: vec![0, 1, 0, 1] }.validate(),
            Err(SourceError::NonPrimitivePattern { period: 2, .. })
        ));
        assert_eq!(
            generate(0, 1, &SourceParams::BiasedCoin { p: 0.5 }),
            Err(SourceError::ZeroLength)
        );
    }

    #[test]
    fn smallest_period_detects_repeats() {
        assert_eq!(smallest_period(&[0, 1, 1]), 3);
        assert_eq!(smallest_period(&[2, 2, 2]), 1);
        assert_eq!(smallest_period(&[0, 1, 0, 0, 1, 0]), 3);
    }

    #[test]
    fn closed_forms_match_model_measures() {
        let processes = [
            SourceParams::GoldenMean { p: 0.5 },
            SourceParams::GoldenMean { p: 0.3 },
            SourceParams::EvenProcess { p: 0.5 },
            SourceParams::BiasedCoin { p: 0.2 },
            SourceParams::Periodic { pattern: vec![0, 0, 1] },
        ];
        for params in processes {
            let model = params.reference_model().unwrap();
            let h = metrics::entropy_rate(&model).unwrap();
            let c = metrics::statistical_complexity(&model).unwrap();
            assert!((h - params.exact_entropy_rate()).abs() < 1e-9, "{params:?}");
            assert!((c - params.exact_statistical_complexity()).abs() < 1e-9, "{params:?}");
            if model.num_states() > 1 {
                let pi = model.stationary_distribution().unwrap();
                for (a, b) in pi.iter().zip(params.exact_stationary_distribution()) {
                    assert!((a - b).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn golden_mean_reference_values() {
        let params = SourceParams::GoldenMean { p: 0.5 };
        assert!((params.exact_entropy_rate() - 2.0 / 3.0).abs() < 1e-12);
        assert!((params.exact_statistical_complexity() - 0.918_295_834).abs() < 1e-8);
    }

    #[test]
    fn even_process_is_not_cryptic() {
        let model = SourceParams::EvenProcess { p: 0.5 }.reference_model().unwrap();
        let c = metrics::statistical_complexity(&model).unwrap();
        let e = metrics::excess_entropy(&model).unwrap();
        assert!((c - e).abs() < 1e-6, "C = {c}, E = {e}");
    }

    #[test]
    fn periodic_process_repeats_pattern() {
        let params = SourceParams::Periodic { pattern: vec![2, 0, 1] };
        let seq = generate(30, 9, &params).unwrap();
        assert_eq!(seq.alphabet().size(), 3);
        let s = seq.symbols();
        for i in 3..s.len() {
            assert_eq!(s[i], s[i - 3]);
        }
        let model = params.reference_model().unwrap();
        assert!(metrics::excess_entropy(&model).unwrap() > 1.5);
    }

    #[test]
    fn golden_mean_never_emits_two_ones() {
        let seq = generate(5_000, 3, &SourceParams::GoldenMean { p: 0.6 }).unwrap();
        assert!(seq.symbols().windows(2).all(|w| w != [1, 1]));
    }

    #[test]
    fn params_serialize_with_process_tag() {
        let json = serde_json::to_value(SourceParams::EvenProcess { p: 0.25 }).unwrap();
        assert_eq!(json["process"], "even_process");
        let back: SourceParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, SourceParams::EvenProcess { p: 0.25 });
    }
}

//! emic core library
//!
//! Infers epsilon-machines (minimal unifilar causal state models) from
//! discrete symbol sequences:
//! - Alphabets, sequences and histories
//! - History trees of next-symbol counts
//! - CSSR inference with pluggable distinguishability tests
//! - Causal state models, their stationary distributions and JSON form
//! - Information measures (Cμ, hμ, E, χ)
//! - Reference processes for generating test sequences
//!
//! ```
//! use emic_config::InferenceConfig;
//! use emic_core::{generate, infer, metrics, SourceParams};
//!
//! let params = SourceParams::BiasedCoin { p: 0.5 };
//! let seq = generate(20_000, 7, &params).unwrap();
//! let outcome = infer(&seq, &InferenceConfig::default().with_max_history_length(2)).unwrap();
//! let h = metrics::entropy_rate(&outcome.model).unwrap();
//! assert!((h - params.exact_entropy_rate()).abs() < 0.05);
//! ```

pub mod alphabet;
pub mod error;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod source;
pub mod tree;

pub use alphabet::{Alphabet, History, Sequence, SequenceError, Symbol};
pub use error::{Error, ErrorCategory, Result};
pub use inference::{
    infer, infer_symbols, ConvergenceStatus, Cssr, Diagnostic, InferenceError, InferenceOutcome,
};
pub use metrics::{
    block_entropy, crypticity, entropy_rate, excess_entropy, statistical_complexity,
    topological_complexity, MetricsReport,
};
pub use model::{CausalState, CausalStateModel, EpsilonMachine, ModelError, StateId};
pub use source::{generate, MachineSource, SourceError, SourceParams};
pub use tree::{HistoryTree, InsufficientData, NextSymbolCounts};

pub use emic_config::{InferenceConfig, TestKind};

//! What an inference run returns besides the model.

use serde::{Deserialize, Serialize};

use emic_config::ConfigSnapshot;

use crate::alphabet::{History, Symbol};
use crate::model::{CausalStateModel, StateId};

/// Why a run stopped before the partition was seen to be stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderConvergence {
    /// Every configured history length was used.
    MaxLengthReached,
    /// No longer history had enough continuations to test.
    DataExhausted,
}

/// Whether the partition stopped changing before the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// A full pass at `history_length` created no state and changed no transition.
    Converged { history_length: usize },
    /// The model is usable but longer histories might still refine it.
    PossiblyUnderConverged {
        history_length: usize,
        reason: UnderConvergence,
    },
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged { .. })
    }

    /// Longest history length the run examined.
    pub fn history_length(&self) -> usize {
        match *self {
            ConvergenceStatus::Converged { history_length }
            | ConvergenceStatus::PossiblyUnderConverged { history_length, .. } => history_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A recoverable condition recorded during inference.
///
/// State ids inside diagnostics are the engine's working ids, allocated in
/// creation order; the returned model renumbers surviving states densely in
/// the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A history was observed but has too few continuations to test.
    DataInsufficiency {
        history: History,
        observed: u64,
        required: u64,
    },
    /// The data cannot support the configured maximum history length.
    DepthLimited { requested: usize, usable: usize },
    /// A history matched several states; its parent's state or else the
    /// oldest was chosen.
    AmbiguousAssignment {
        history: History,
        candidates: Vec<StateId>,
        chosen: StateId,
    },
    /// Histories of one state disagreed on a successor; the state was split.
    ConsistencyViolation {
        state: StateId,
        symbol: Symbol,
        successors: Vec<StateId>,
        split_into: Vec<StateId>,
    },
    /// A successor lookup landed on a history whose extensions span several
    /// states; the best supported one was used.
    AmbiguousSuccessor {
        history: History,
        symbol: Symbol,
        candidates: Vec<StateId>,
        chosen: StateId,
    },
    /// An observed symbol had no resolvable successor and was dropped.
    UnresolvedTransition {
        state: StateId,
        symbol: Symbol,
        observations: u64,
    },
    /// States that are not recurrent were pruned.
    TransientStatesRemoved { states: Vec<StateId> },
    /// The maximum history length was reached while the partition still changed.
    NonConvergence { max_history_length: usize },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DataInsufficiency { .. } | Diagnostic::TransientStatesRemoved { .. } => {
                Severity::Info
            }
            _ => Severity::Warning,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::DataInsufficiency { .. } => "data_insufficiency",
            Diagnostic::DepthLimited { .. } => "depth_limited",
            Diagnostic::AmbiguousAssignment { .. } => "ambiguous_assignment",
            Diagnostic::ConsistencyViolation { .. } => "consistency_violation",
            Diagnostic::AmbiguousSuccessor { .. } => "ambiguous_successor",
            Diagnostic::UnresolvedTransition { .. } => "unresolved_transition",
            Diagnostic::TransientStatesRemoved { .. } => "transient_states_removed",
            Diagnostic::NonConvergence { .. } => "non_convergence",
        }
    }
}

/// Bookkeeping for one refinement pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Length of the histories added by this pass.
    pub history_length: usize,
    /// Histories tested against the partition.
    pub candidates: usize,
    /// Observed histories skipped for lack of data.
    pub deferred: usize,
    /// States created by homogenization.
    pub created: usize,
    /// States created by determinization splits.
    pub splits: usize,
    /// State ids allocated so far, including emptied states.
    pub states_allocated: usize,
    /// States holding at least one history.
    pub live_states: usize,
    /// Whether the transition structure differs from the previous pass.
    pub transitions_changed: bool,
}

/// The result of [`crate::infer`].
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub model: CausalStateModel,
    pub status: ConvergenceStatus,
    pub diagnostics: Vec<Diagnostic>,
    pub passes: Vec<PassSummary>,
    pub config: ConfigSnapshot,
}

impl InferenceOutcome {
    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn diagnostics_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind() == kind)
    }
}

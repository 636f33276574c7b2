//! Causal state models (epsilon-machines).
//!
//! A model is a finite set of states, each with a next-symbol distribution
//! and a deterministic transition on every symbol it can emit. The support of
//! a state's distribution is exactly the set of symbols with a transition.

mod builder;
mod serialize;
mod stationary;

pub use builder::CausalStateModelBuilder;
pub use serialize::{model_json_schema, ModelDocument, StateDocument, TransitionDocument};
pub use stationary::{closed_components, strongly_connected_components};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

use crate::alphabet::{Alphabet, History, Symbol};

/// Tolerance for comparing probabilities across models.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Schema version written into serialized models.
pub const MODEL_SCHEMA_VERSION: &str = "1.0.0";

/// Dense identifier of a causal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(u32);

impl StateId {
    pub fn new(index: usize) -> Self {
        StateId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Errors from querying, building or decoding a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("no transition from {state} on symbol {symbol}")]
    UndefinedTransition { state: StateId, symbol: Symbol },

    #[error("unknown state {0}")]
    UnknownState(StateId),

    #[error("no unique stationary distribution: {reason}")]
    NoStationaryDistribution { reason: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("model serialization failed: {0}")]
    Serialization(String),
}

/// One causal state: its predictive distribution and the histories it groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalState {
    id: StateId,
    distribution: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    counts: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    histories: Vec<History>,
}

impl CausalState {
    pub fn id(&self) -> StateId {
        self.id
    }

    /// P(symbol | state), indexed by symbol.
    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    pub fn probability(&self, symbol: Symbol) -> f64 {
        self.distribution.get(symbol as usize).copied().unwrap_or(0.0)
    }

    /// Pooled observation counts, when the state was inferred from data.
    pub fn counts(&self) -> Option<&[u64]> {
        self.counts.as_deref()
    }

    /// Histories assigned to this state during inference.
    pub fn histories(&self) -> &[History] {
        &self.histories
    }

    /// Symbols emitted with positive probability.
    pub fn support(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.distribution
            .iter()
            .enumerate()
            .filter(|(_, &p)| p > 0.0)
            .map(|(s, _)| s as Symbol)
    }

    /// Entropy of the next-symbol distribution in bits.
    pub fn entropy(&self) -> f64 {
        emic_math::entropy_bits(&self.distribution)
    }
}

/// A unifilar hidden Markov model over causal states.
#[derive(Debug, Clone, PartialEq)]
pub struct CausalStateModel {
    alphabet: Alphabet,
    states: Vec<CausalState>,
    // transitions[state][symbol]
    transitions: Vec<Vec<Option<StateId>>>,
    start: Option<StateId>,
}

/// The minimal unifilar presentation of a process.
pub type EpsilonMachine = CausalStateModel;

impl CausalStateModel {
    pub fn builder(alphabet_size: usize) -> Result<CausalStateModelBuilder, ModelError> {
        CausalStateModelBuilder::new(alphabet_size)
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[CausalState] {
        &self.states
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId::new)
    }

    pub fn state(&self, id: StateId) -> Result<&CausalState, ModelError> {
        self.states
            .get(id.index())
            .ok_or(ModelError::UnknownState(id))
    }

    /// Designated start state, if the model has one.
    pub fn start_state(&self) -> Option<StateId> {
        self.start
    }

    /// δ(state, symbol).
    pub fn transition(&self, state: StateId, symbol: Symbol) -> Result<StateId, ModelError> {
        self.state(state)?;
        self.transitions[state.index()]
            .get(symbol as usize)
            .copied()
            .flatten()
            .ok_or(ModelError::UndefinedTransition { state, symbol })
    }

    /// Defined transitions out of `state` as `(symbol, target)`.
    pub fn transitions_from(&self, state: StateId) -> Vec<(Symbol, StateId)> {
        self.transitions
            .get(state.index())
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(s, t)| t.map(|t| (s as Symbol, t)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// P(symbol | state).
    pub fn symbol_probability(&self, state: StateId, symbol: Symbol) -> Result<f64, ModelError> {
        Ok(self.state(state)?.probability(symbol))
    }

    /// Row-stochastic state-to-state matrix, summed over symbols.
    pub fn transition_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.states.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for (i, state) in self.states.iter().enumerate() {
            for (symbol, target) in self.transitions_from(state.id) {
                matrix[i][target.index()] += state.probability(symbol);
            }
        }
        matrix
    }

    /// Symbol-labeled matrices: `T[a][i][j] = P(a | i)` when δ(i, a) = j.
    pub fn labeled_transition_matrices(&self) -> Vec<Vec<Vec<f64>>> {
        let n = self.states.len();
        let mut out = vec![vec![vec![0.0; n]; n]; self.alphabet.size()];
        for (i, state) in self.states.iter().enumerate() {
            for (symbol, target) in self.transitions_from(state.id) {
                out[symbol as usize][i][target.index()] = state.probability(symbol);
            }
        }
        out
    }

    /// State adjacency lists (successor indices, deduplicated, ascending).
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        self.transitions
            .iter()
            .map(|row| {
                let mut next: Vec<usize> = row.iter().flatten().map(|t| t.index()).collect();
                next.sort_unstable();
                next.dedup();
                next
            })
            .collect()
    }

    /// True when every state reaches every other state.
    pub fn is_irreducible(&self) -> bool {
        strongly_connected_components(&self.adjacency()).len() == 1
    }

    /// The unique stationary distribution π with π T = π.
    ///
    /// Requires an irreducible chain; periodic chains are accepted since the
    /// stationary distribution is still unique.
    pub fn stationary_distribution(&self) -> Result<Vec<f64>, ModelError> {
        let components = strongly_connected_components(&self.adjacency());
        if components.len() != 1 {
            return Err(ModelError::NoStationaryDistribution {
                reason: format!(
                    "chain is reducible: {} communicating classes",
                    components.len()
                ),
            });
        }
        stationary::solve_stationary(&self.transition_matrix())
    }

    /// Structural equality up to relabeling of states, with distributions
    /// compared to within `tolerance`.
    pub fn structurally_equivalent(&self, other: &CausalStateModel, tolerance: f64) -> bool {
        if self.alphabet != other.alphabet || self.num_states() != other.num_states() {
            return false;
        }
        if self.num_states() == 0 {
            return true;
        }
        let root = match self.spanning_root() {
            Some(root) => root,
            None => return self.matches_under(other, &self.identity_map(), tolerance),
        };
        other
            .state_ids()
            .any(|candidate| match self.map_from(root, other, candidate) {
                Some(map) => self.matches_under(other, &map, tolerance),
                None => false,
            })
    }

    fn identity_map(&self) -> Vec<StateId> {
        self.state_ids().collect()
    }

    /// A state from which every state is reachable.
    fn spanning_root(&self) -> Option<StateId> {
        let adjacency = self.adjacency();
        self.state_ids()
            .find(|&s| reachable_from(&adjacency, s.index()).iter().all(|&r| r))
    }

    /// Extend `root -> image` along transitions into a full state map.
    fn map_from(
        &self,
        root: StateId,
        other: &CausalStateModel,
        image: StateId,
    ) -> Option<Vec<StateId>> {
        let mut map: Vec<Option<StateId>> = vec![None; self.num_states()];
        let mut used = vec![false; other.num_states()];
        map[root.index()] = Some(image);
        used[image.index()] = true;
        let mut queue = VecDeque::from([root]);

        while let Some(s) = queue.pop_front() {
            let t = map[s.index()]?;
            for symbol in self.alphabet.symbols() {
                let mine = self.transitions[s.index()][symbol as usize];
                let theirs = other.transitions[t.index()][symbol as usize];
                match (mine, theirs) {
                    (None, None) => {}
                    (Some(a), Some(b)) => match map[a.index()] {
                        Some(existing) if existing == b => {}
                        Some(_) => return None,
                        None => {
                            if used[b.index()] {
                                return None;
                            }
                            map[a.index()] = Some(b);
                            used[b.index()] = true;
                            queue.push_back(a);
                        }
                    },
                    _ => return None,
                }
            }
        }
        map.into_iter().collect()
    }

    fn matches_under(&self, other: &CausalStateModel, map: &[StateId], tolerance: f64) -> bool {
        self.states.iter().all(|state| {
            let Some(image) = other.states.get(map[state.id.index()].index()) else {
                return false;
            };
            let same_distribution = state
                .distribution
                .iter()
                .zip(&image.distribution)
                .all(|(a, b)| (a - b).abs() <= tolerance);
            let same_edges = self.alphabet.symbols().all(|symbol| {
                let mine = self.transitions[state.id.index()][symbol as usize];
                let theirs = other.transitions[image.id.index()][symbol as usize];
                mine.map(|m| map[m.index()]) == theirs
            });
            same_distribution && same_edges
        })
    }
}

pub(crate) fn reachable_from(adjacency: &[Vec<usize>], start: usize) -> Vec<bool> {
    let mut seen = vec![false; adjacency.len()];
    let mut stack = vec![start];
    seen[start] = true;
    while let Some(v) = stack.pop() {
        for &w in &adjacency[v] {
            if !seen[w] {
                seen[w] = true;
                stack.push(w);
            }
        }
    }
    seen
}

//! Incremental construction of validated models.

use super::{CausalState, CausalStateModel, ModelError, StateId};
use crate::alphabet::{Alphabet, History, Symbol};

/// Tolerance on the sum of a state's emission probabilities.
const NORMALIZATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
struct StateSpec {
    counts: Option<Vec<u64>>,
    histories: Vec<History>,
}

#[derive(Debug, Clone, Copy)]
struct Emission {
    from: StateId,
    symbol: Symbol,
    probability: f64,
    to: StateId,
}

/// Builds a [`CausalStateModel`], checking every structural rule at the end.
///
/// ```
/// use emic_core::model::CausalStateModel;
///
/// let mut b = CausalStateModel::builder(2).unwrap();
/// let a = b.add_state();
/// let c = b.add_state();
/// b.emit(a, 0, 0.5, a).emit(a, 1, 0.5, c).emit(c, 0, 1.0, a);
/// let model = b.build().unwrap();
/// assert_eq!(model.num_states(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CausalStateModelBuilder {
    alphabet: Alphabet,
    states: Vec<StateSpec>,
    emissions: Vec<Emission>,
    start: Option<StateId>,
    error: Option<String>,
}

impl CausalStateModelBuilder {
    pub fn new(alphabet_size: usize) -> Result<Self, ModelError> {
        let alphabet =
            Alphabet::new(alphabet_size).map_err(|e| ModelError::InvalidModel(e.to_string()))?;
        Ok(CausalStateModelBuilder {
            alphabet,
            states: Vec::new(),
            emissions: Vec::new(),
            start: None,
            error: None,
        })
    }

    /// Allocate the next state id.
    pub fn add_state(&mut self) -> StateId {
        self.states.push(StateSpec::default());
        StateId::new(self.states.len() - 1)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// In `from`, emit `symbol` with `probability` and move to `to`.
    pub fn emit(
        &mut self,
        from: StateId,
        symbol: Symbol,
        probability: f64,
        to: StateId,
    ) -> &mut Self {
        self.emissions.push(Emission {
            from,
            symbol,
            probability,
            to,
        });
        self
    }

    /// Attach the pooled observation counts of an inferred state.
    pub fn counts(&mut self, state: StateId, counts: Vec<u64>) -> &mut Self {
        match self.states.get_mut(state.index()) {
            Some(spec) => spec.counts = Some(counts),
            None => self.fail(format!("counts given for unknown state {}", state)),
        }
        self
    }

    /// Attach the histories grouped into a state.
    pub fn histories(&mut self, state: StateId, histories: Vec<History>) -> &mut Self {
        match self.states.get_mut(state.index()) {
            Some(spec) => spec.histories = histories,
            None => self.fail(format!("histories given for unknown state {}", state)),
        }
        self
    }

    pub fn start(&mut self, state: StateId) -> &mut Self {
        self.start = Some(state);
        self
    }

    fn fail(&mut self, message: String) {
        self.error.get_or_insert(message);
    }

    /// Validate and assemble the model.
    pub fn build(self) -> Result<CausalStateModel, ModelError> {
        if let Some(message) = self.error {
            return Err(ModelError::InvalidModel(message));
        }
        let n = self.states.len();
        let k = self.alphabet.size();
        if n == 0 {
            return Err(ModelError::InvalidModel("model has no states".to_string()));
        }

        let mut distributions = vec![vec![0.0; k]; n];
        let mut transitions: Vec<Vec<Option<StateId>>> = vec![vec![None; k]; n];

        for e in &self.emissions {
            if e.from.index() >= n || e.to.index() >= n {
                return Err(ModelError::InvalidModel(format!(
                    "transition {} -> {} references a missing state",
                    e.from, e.to
                )));
            }
            if !self.alphabet.contains(e.symbol) {
                return Err(ModelError::InvalidModel(format!(
                    "symbol {} outside alphabet of size {}",
                    e.symbol, k
                )));
            }
            if !e.probability.is_finite()
                || e.probability <= 0.0
                || e.probability > 1.0 + NORMALIZATION_TOLERANCE
            {
                return Err(ModelError::InvalidModel(format!(
                    "{} emits {} with probability {}",
                    e.from, e.symbol, e.probability
                )));
            }
            let slot = &mut transitions[e.from.index()][e.symbol as usize];
            if slot.is_some() {
                return Err(ModelError::InvalidModel(format!(
                    "{} has two transitions on symbol {}",
                    e.from, e.symbol
                )));
            }
            *slot = Some(e.to);
            distributions[e.from.index()][e.symbol as usize] = e.probability;
        }

        for (i, dist) in distributions.iter().enumerate() {
            let total: f64 = dist.iter().sum();
            if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
                return Err(ModelError::InvalidModel(format!(
                    "emission probabilities of {} sum to {}",
                    StateId::new(i),
                    total
                )));
            }
        }

        if let Some(start) = self.start {
            if start.index() >= n {
                return Err(ModelError::InvalidModel(format!(
                    "start state {} does not exist",
                    start
                )));
            }
        }

        let mut states = Vec::with_capacity(n);
        for (i, (spec, distribution)) in self.states.into_iter().zip(distributions).enumerate() {
            if let Some(counts) = &spec.counts {
                if counts.len() != k {
                    return Err(ModelError::InvalidModel(format!(
                        "counts of {} have {} entries for {} symbols",
                        StateId::new(i),
                        counts.len(),
                        k
                    )));
                }
            }
            states.push(CausalState {
                id: StateId::new(i),
                distribution,
                counts: spec.counts,
                histories: spec.histories,
            });
        }

        Ok(CausalStateModel {
            alphabet: self.alphabet,
            states,
            transitions,
            start: self.start,
        })
    }
}

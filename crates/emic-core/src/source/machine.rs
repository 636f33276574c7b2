use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::SourceError;
use crate::alphabet::{Sequence, Symbol};
use crate::model::{CausalStateModel, StateId};

/// Samples symbol sequences from any causal state model.
#[derive(Debug, Clone, Copy)]
pub struct MachineSource<'a> {
    model: &'a CausalStateModel,
}

impl<'a> MachineSource<'a> {
    pub fn new(model: &'a CausalStateModel) -> Self {
        MachineSource { model }
    }

    pub fn model(&self) -> &'a CausalStateModel {
        self.model
    }

    /// Draw `length` symbols. Identical `(length, seed)` always yields the
    /// same sequence.
    ///
    /// The initial state is drawn from the stationary distribution; a model
    /// without one starts in its start state (or the first state).
    pub fn generate(&self, length: usize, seed: u64) -> Result<Sequence, SourceError> {
        if length == 0 {
            return Err(SourceError::ZeroLength);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = self.initial_state(&mut rng);
        let mut symbols = Vec::with_capacity(length);
        for _ in 0..length {
            let symbol = self.sample_symbol(state, &mut rng)?;
            state = self.model.transition(state, symbol)?;
            symbols.push(symbol);
        }
        Ok(Sequence::new(symbols, self.model.alphabet())?)
    }

    fn initial_state(&self, rng: &mut StdRng) -> StateId {
        match self.model.stationary_distribution() {
            Ok(pi) => StateId::new(sample_index(&pi, rng.random::<f64>())),
            Err(_) => self.model.start_state().unwrap_or(StateId::new(0)),
        }
    }

    fn sample_symbol(&self, state: StateId, rng: &mut StdRng) -> Result<Symbol, SourceError> {
        let distribution = self.model.state(state)?.distribution();
        Ok(sample_index(distribution, rng.random::<f64>()) as Symbol)
    }
}

// Inverse-CDF lookup; rounding leftovers land on the last positive entry.
fn sample_index(weights: &[f64], u: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last = i;
        if u < cumulative {
            return i;
        }
    }
    last
}

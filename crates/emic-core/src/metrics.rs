//! Information-theoretic measures of a causal state model, in bits.
//!
//! Cμ and hμ come straight from the stationary distribution. Block entropies
//! and the excess entropy are computed by propagating beliefs over states
//! ("mixed states") forward from π: after a word `w` the belief is
//! P(state | w), and `h(L)` is the expected next-symbol entropy under the
//! beliefs reachable by words of length `L - 1`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use emic_math::entropy_bits;

use crate::logging::{event_names, Stage};
use crate::model::{CausalStateModel, ModelError};

/// Stop summing `h(L) - hμ` once a term falls below this.
pub const EXCESS_ENTROPY_TOLERANCE: f64 = 1e-12;
/// Upper bound on the word length explored for excess entropy.
pub const MAX_BLOCK_LENGTH: usize = 256;
/// Upper bound on distinct beliefs carried between steps. When exceeded,
/// the lightest beliefs are dropped and the rest rescaled to keep their mass.
pub const MAX_BELIEFS: usize = 4096;
/// Beliefs with less probability than this are dropped.
const MIN_BELIEF_MASS: f64 = 1e-15;
/// Resolution at which nearly equal beliefs are merged.
const BELIEF_RESOLUTION: f64 = 1e12;

/// Cμ = H(π).
pub fn statistical_complexity(model: &CausalStateModel) -> Result<f64, ModelError> {
    if model.num_states() == 1 {
        return Ok(0.0);
    }
    Ok(entropy_bits(&model.stationary_distribution()?))
}

/// hμ = Σ π_i H(P(·|i)).
pub fn entropy_rate(model: &CausalStateModel) -> Result<f64, ModelError> {
    let pi = stationary(model)?;
    Ok(entropy_rate_with(model, &pi))
}

fn entropy_rate_with(model: &CausalStateModel, pi: &[f64]) -> f64 {
    model
        .states()
        .iter()
        .zip(pi)
        .map(|(state, &p)| p * state.entropy())
        .sum()
}

fn stationary(model: &CausalStateModel) -> Result<Vec<f64>, ModelError> {
    if model.num_states() == 1 {
        return Ok(vec![1.0]);
    }
    model.stationary_distribution()
}

/// Shannon entropy H(L) of words of length `length`.
pub fn block_entropy(model: &CausalStateModel, length: usize) -> Result<f64, ModelError> {
    let pi = stationary(model)?;
    let mut beliefs = MixedStates::start(&pi);
    let mut total = 0.0;
    for _ in 0..length {
        total += beliefs.next_symbol_entropy(model);
        beliefs = beliefs.advance(model);
    }
    Ok(total)
}

/// E = Σ_{L≥1} (h(L) - hμ), the information the past shares with the future.
pub fn excess_entropy(model: &CausalStateModel) -> Result<f64, ModelError> {
    let pi = stationary(model)?;
    let h_mu = entropy_rate_with(model, &pi);
    let mut beliefs = MixedStates::start(&pi);
    let mut excess = 0.0;
    for _ in 0..MAX_BLOCK_LENGTH {
        let gap = (beliefs.next_symbol_entropy(model) - h_mu).max(0.0);
        excess += gap;
        if gap < EXCESS_ENTROPY_TOLERANCE {
            break;
        }
        beliefs = beliefs.advance(model);
    }
    Ok(excess)
}

/// χ = Cμ - E.
pub fn crypticity(model: &CausalStateModel) -> Result<f64, ModelError> {
    Ok((statistical_complexity(model)? - excess_entropy(model)?).max(0.0))
}

/// log2 of the number of states.
pub fn topological_complexity(model: &CausalStateModel) -> f64 {
    (model.num_states() as f64).log2()
}

/// Every measure of one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub num_states: usize,
    pub statistical_complexity: f64,
    pub entropy_rate: f64,
    pub excess_entropy: f64,
    pub crypticity: f64,
    pub topological_complexity: f64,
}

impl MetricsReport {
    pub fn compute(model: &CausalStateModel) -> Result<Self, ModelError> {
        let statistical_complexity = statistical_complexity(model)?;
        let excess_entropy = excess_entropy(model)?;
        let report = MetricsReport {
            num_states: model.num_states(),
            statistical_complexity,
            entropy_rate: entropy_rate(model)?,
            excess_entropy,
            crypticity: (statistical_complexity - excess_entropy).max(0.0),
            topological_complexity: topological_complexity(model),
        };
        tracing::debug!(
            event = event_names::METRICS_COMPUTED,
            stage = %Stage::Metrics,
            states = report.num_states,
            c_mu = report.statistical_complexity,
            h_mu = report.entropy_rate,
            excess = report.excess_entropy,
            "metrics computed"
        );
        Ok(report)
    }
}

/// A weighted set of beliefs over states.
struct MixedStates {
    // belief vector with its probability
    beliefs: Vec<(Vec<f64>, f64)>,
}

impl MixedStates {
    fn start(pi: &[f64]) -> Self {
        MixedStates {
            beliefs: vec![(pi.to_vec(), 1.0)],
        }
    }

    /// Next-symbol distribution under `belief`.
    fn predict(model: &CausalStateModel, belief: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; model.alphabet().size()];
        for (state, &weight) in model.states().iter().zip(belief) {
            if weight == 0.0 {
                continue;
            }
            for (symbol, p) in state.distribution().iter().enumerate() {
                out[symbol] += weight * p;
            }
        }
        out
    }

    fn next_symbol_entropy(&self, model: &CausalStateModel) -> f64 {
        self.beliefs
            .iter()
            .map(|(belief, mass)| mass * entropy_bits(&Self::predict(model, belief)))
            .sum()
    }

    fn advance(self, model: &CausalStateModel) -> Self {
        self.advance_capped(model, MAX_BELIEFS)
    }

    fn advance_capped(self, model: &CausalStateModel, cap: usize) -> Self {
        let n = model.num_states();
        let mut merged: BTreeMap<Vec<i64>, (Vec<f64>, f64)> = BTreeMap::new();

        for (belief, mass) in &self.beliefs {
            for symbol in model.alphabet().symbols() {
                let mut next = vec![0.0; n];
                let mut emitted = 0.0;
                for (i, &weight) in belief.iter().enumerate() {
                    if weight == 0.0 {
                        continue;
                    }
                    let state = &model.states()[i];
                    let p = state.probability(symbol);
                    if p == 0.0 {
                        continue;
                    }
                    if let Ok(target) = model.transition(state.id(), symbol) {
                        next[target.index()] += weight * p;
                        emitted += weight * p;
                    }
                }
                let word_mass = mass * emitted;
                if emitted <= 0.0 || word_mass < MIN_BELIEF_MASS {
                    continue;
                }
                for v in next.iter_mut() {
                    *v /= emitted;
                }
                let key: Vec<i64> = next
                    .iter()
                    .map(|v| (v * BELIEF_RESOLUTION).round() as i64)
                    .collect();
                merged
                    .entry(key)
                    .and_modify(|(_, m)| *m += word_mass)
                    .or_insert((next, word_mass));
            }
        }

        let mut beliefs: Vec<(Vec<f64>, f64)> = merged.into_values().collect();
        if beliefs.len() > cap {
            let total: f64 = beliefs.iter().map(|(_, m)| m).sum();
            // keep the heaviest beliefs; ties resolved by the stable key order
            beliefs.sort_by(|a, b| b.1.total_cmp(&a.1));
            let dropped = beliefs.len() - cap;
            beliefs.truncate(cap);
            let kept: f64 = beliefs.iter().map(|(_, m)| m).sum();
            tracing::warn!(
                event = event_names::BELIEFS_TRUNCATED,
                stage = %Stage::Metrics,
                dropped,
                dropped_mass = total - kept,
                "too many mixed states; lightest dropped and the rest rescaled"
            );
            if kept > 0.0 {
                for (_, mass) in &mut beliefs {
                    *mass *= total / kept;
                }
            }
        }
        MixedStates { beliefs }
    }
}

//! Causal State Splitting Reconstruction.
//!
//! Each pass extends the frontier histories one symbol into the past, tests
//! every resolvable extension against a frozen snapshot of the states, and
//! then splits states until transitions are deterministic. An extension that
//! matches several states stays with its parent's state when that is one of
//! them. Candidate tests run in parallel; everything that mutates the
//! partition runs on one thread.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use emic_config::{ConfigSnapshot, InferenceConfig};

use crate::alphabet::{History, Sequence, Symbol};
use crate::logging::{event_names, Stage};
use crate::model::{closed_components, CausalStateModel, StateId};
use crate::tree::{HistoryTree, NextSymbolCounts};

use super::distinguish::{test_for, DistinguishabilityTest};
use super::outcome::{
    ConvergenceStatus, Diagnostic, InferenceOutcome, PassSummary, UnderConvergence,
};
use super::partition::Partition;
use super::InferenceError;

/// A configured CSSR run.
#[derive(Debug, Clone)]
pub struct Cssr {
    config: InferenceConfig,
    test: Arc<dyn DistinguishabilityTest>,
}

/// An extension `c·h` of a frontier history `h`.
struct Candidate<'t> {
    parent: History,
    parent_state: StateId,
    child: History,
    counts: &'t [u64],
}

/// What one homogenization pass did.
#[derive(Debug, Default)]
struct PassCounts {
    candidates: usize,
    deferred: usize,
    created: usize,
}

impl Cssr {
    /// Validate `config` and select its distinguishability test.
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;
        Ok(Cssr {
            config: config.clone(),
            test: test_for(config.test),
        })
    }

    /// Replace the configured test with a custom one.
    pub fn with_test(mut self, test: Arc<dyn DistinguishabilityTest>) -> Self {
        self.test = test;
        self
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn run(&self, sequence: &Sequence) -> Result<InferenceOutcome, InferenceError> {
        if sequence.is_empty() {
            return Err(InferenceError::MalformedInput(
                "sequence is empty".to_string(),
            ));
        }

        let max_len = self.config.max_history_length;
        let span = tracing::info_span!(
            "infer",
            symbols = sequence.len(),
            alphabet = sequence.alphabet().size(),
            max_history_length = max_len,
            test = self.test.name(),
        );
        let _enter = span.enter();

        tracing::info!(
            event = event_names::INFER_STARTED,
            stage = %Stage::Tree,
            significance_level = self.config.significance_level,
            min_count = self.config.min_count,
            "inference started"
        );

        let tree = HistoryTree::build(sequence, max_len, self.config.min_count);
        tracing::debug!(
            event = event_names::TREE_BUILT,
            stage = %Stage::Tree,
            histories = tree.len(),
            "history tree built"
        );

        let mut diagnostics = Vec::new();
        let usable = tree.resolvable_depth().unwrap_or(0);
        if usable < max_len {
            tracing::warn!(
                event = event_names::DEPTH_LIMITED,
                stage = %Stage::Tree,
                requested = max_len,
                usable,
                "data supports shorter histories than requested"
            );
            diagnostics.push(Diagnostic::DepthLimited {
                requested: max_len,
                usable,
            });
        }

        let mut partition = Partition::new(&tree);
        let mut passes = Vec::new();
        let mut previous = partition.transition_table();
        let mut status = None;

        for len in 0..max_len {
            let counts = self.homogenize(&mut partition, len, &mut diagnostics);
            if counts.candidates == 0 {
                status = Some(ConvergenceStatus::PossiblyUnderConverged {
                    history_length: len,
                    reason: UnderConvergence::DataExhausted,
                });
                break;
            }

            let splits = partition.determinize(&mut diagnostics);
            let table = partition.transition_table();
            let transitions_changed = table != previous;
            let summary = PassSummary {
                history_length: len + 1,
                candidates: counts.candidates,
                deferred: counts.deferred,
                created: counts.created,
                splits,
                states_allocated: partition.allocated(),
                live_states: partition.live_ids().len(),
                transitions_changed,
            };
            tracing::info!(
                event = event_names::PASS_FINISHED,
                stage = %Stage::Homogenize,
                history_length = summary.history_length,
                candidates = summary.candidates,
                deferred = summary.deferred,
                created = summary.created,
                splits = summary.splits,
                live_states = summary.live_states,
                transitions_changed,
                "refinement pass finished"
            );
            passes.push(summary);

            if counts.created == 0 && splits == 0 && !transitions_changed {
                status = Some(ConvergenceStatus::Converged {
                    history_length: len + 1,
                });
                break;
            }
            previous = table;
        }

        let status = match status {
            Some(status) => status,
            None => {
                tracing::warn!(
                    event = event_names::NON_CONVERGENCE,
                    stage = %Stage::Homogenize,
                    max_history_length = max_len,
                    "maximum history length reached before the partition stabilized"
                );
                diagnostics.push(Diagnostic::NonConvergence {
                    max_history_length: max_len,
                });
                ConvergenceStatus::PossiblyUnderConverged {
                    history_length: max_len,
                    reason: UnderConvergence::MaxLengthReached,
                }
            }
        };

        let model = finalize(&partition, &mut diagnostics)?;
        tracing::info!(
            event = event_names::INFER_FINISHED,
            stage = %Stage::Finalize,
            states = model.num_states(),
            converged = status.is_converged(),
            diagnostics = diagnostics.len(),
            "inference finished"
        );

        Ok(InferenceOutcome {
            model,
            status,
            diagnostics,
            passes,
            config: ConfigSnapshot::of(&self.config),
        })
    }

    /// Extend every frontier history of length `len` and place each
    /// resolvable extension in a state.
    fn homogenize(
        &self,
        partition: &mut Partition<'_>,
        len: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> PassCounts {
        let tree = partition.tree();
        let mut counts = PassCounts::default();
        let mut candidates = Vec::new();

        for (parent, parent_state) in partition.frontier(len) {
            for c in tree.alphabet().symbols() {
                let child = parent.extend_past(c);
                match tree.distribution(child.as_slice()) {
                    Ok(next) => candidates.push(Candidate {
                        parent: parent.clone(),
                        parent_state,
                        child,
                        counts: next.counts(),
                    }),
                    Err(short) if short.observed > 0 => {
                        counts.deferred += 1;
                        tracing::debug!(
                            event = event_names::DATA_INSUFFICIENT,
                            stage = %Stage::Homogenize,
                            history = %short.history,
                            observed = short.observed,
                            required = short.required,
                            "history deferred"
                        );
                        diagnostics.push(Diagnostic::DataInsufficiency {
                            history: short.history,
                            observed: short.observed,
                            required: short.required,
                        });
                    }
                    Err(_) => {}
                }
            }
        }
        counts.candidates = candidates.len();
        if candidates.is_empty() {
            return counts;
        }

        // Tests against the frozen partition are independent of each other.
        let snapshot = partition.snapshot();
        let alpha = self.config.significance_level;
        let test = self.test.as_ref();
        let matching = |candidate: &Candidate<'_>| -> Vec<StateId> {
            snapshot
                .iter()
                .filter(|(_, pooled)| !test.distinguishable(candidate.counts, pooled, alpha))
                .map(|(id, _)| *id)
                .collect()
        };
        let matches: Vec<Vec<StateId>> = if self.config.parallel {
            candidates.par_iter().map(matching).collect()
        } else {
            candidates.iter().map(matching).collect()
        };

        partition.begin_level();
        let mut retired: HashSet<History> = HashSet::new();
        let mut created: Vec<StateId> = Vec::new();
        for (candidate, mut found) in candidates.into_iter().zip(matches) {
            if retired.insert(candidate.parent.clone()) {
                partition.retire(&candidate.parent);
            }
            for &id in &created {
                let pooled = partition.slot(id).counts().counts();
                if !self.test.distinguishable(candidate.counts, pooled, alpha) {
                    found.push(id);
                }
            }
            found.sort_unstable();
            found.dedup();

            let target = match found.as_slice() {
                [] => {
                    let id = partition.create_state();
                    tracing::debug!(
                        event = event_names::STATE_CREATED,
                        stage = %Stage::Homogenize,
                        state = %id,
                        history = %candidate.child,
                        "new state"
                    );
                    created.push(id);
                    id
                }
                [only] => *only,
                [oldest, ..] => {
                    let chosen = if found.contains(&candidate.parent_state) {
                        candidate.parent_state
                    } else {
                        *oldest
                    };
                    tracing::warn!(
                        event = event_names::AMBIGUOUS_ASSIGNMENT,
                        stage = %Stage::Homogenize,
                        history = %candidate.child,
                        candidates = ?found,
                        chosen = %chosen,
                        "history matches several states; keeping the parent's or the oldest"
                    );
                    diagnostics.push(Diagnostic::AmbiguousAssignment {
                        history: candidate.child.clone(),
                        candidates: found.clone(),
                        chosen,
                    });
                    chosen
                }
            };
            partition.assign(candidate.child, target);
        }
        counts.created = created.len();
        counts
    }
}

/// Turn the refined partition into a model of its recurrent states.
fn finalize(
    partition: &Partition<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<CausalStateModel, InferenceError> {
    let mut nodes: BTreeMap<StateId, (NextSymbolCounts, BTreeMap<Symbol, StateId>)> =
        BTreeMap::new();
    for id in partition.live_ids() {
        let mut counts = partition.basis_counts(id);
        let mut edges = BTreeMap::new();
        let support: Vec<Symbol> = counts.support().collect();
        for symbol in support {
            match partition.state_successor(id, symbol) {
                Some(target) => {
                    edges.insert(symbol, target);
                }
                None => {
                    unresolved(id, symbol, counts.get(symbol), diagnostics);
                    counts.clear_symbol(symbol);
                }
            }
        }
        nodes.insert(id, (counts, edges));
    }

    // Dropping a state can orphan edges into it, so repeat until stable.
    loop {
        let dead: BTreeSet<StateId> = nodes
            .iter()
            .filter(|(_, (counts, _))| counts.total() == 0)
            .map(|(id, _)| *id)
            .collect();
        if dead.is_empty() {
            break;
        }
        nodes.retain(|id, _| !dead.contains(id));
        for (&id, (counts, edges)) in nodes.iter_mut() {
            let orphaned: Vec<Symbol> = edges
                .iter()
                .filter(|(_, target)| dead.contains(*target))
                .map(|(&symbol, _)| symbol)
                .collect();
            for symbol in orphaned {
                unresolved(id, symbol, counts.get(symbol), diagnostics);
                counts.clear_symbol(symbol);
                edges.remove(&symbol);
            }
        }
    }

    if nodes.is_empty() {
        return marginal_model(partition.tree());
    }

    // Keep the closed classes of the transition graph.
    let ids: Vec<StateId> = nodes.keys().copied().collect();
    let position: BTreeMap<StateId, usize> =
        ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            let mut next: Vec<usize> = nodes[id].1.values().map(|t| position[t]).collect();
            next.sort_unstable();
            next.dedup();
            next
        })
        .collect();
    let mut keep: Vec<usize> = closed_components(&adjacency).into_iter().flatten().collect();
    keep.sort_unstable();
    let kept: Vec<StateId> = keep.iter().map(|&i| ids[i]).collect();

    let transient: Vec<StateId> = ids.iter().copied().filter(|id| !kept.contains(id)).collect();
    if !transient.is_empty() {
        tracing::info!(
            event = event_names::TRANSIENTS_REMOVED,
            stage = %Stage::Finalize,
            states = ?transient,
            "removed transient states"
        );
        diagnostics.push(Diagnostic::TransientStatesRemoved { states: transient });
    }

    let label: BTreeMap<StateId, StateId> = kept
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, StateId::new(i)))
        .collect();
    let tree = partition.tree();
    let mut builder = CausalStateModel::builder(tree.alphabet().size())?;
    for &id in &kept {
        let state = builder.add_state();
        let (counts, _) = &nodes[&id];
        builder
            .counts(state, counts.counts().to_vec())
            .histories(state, partition.basis(id));
    }
    for &id in &kept {
        let (counts, edges) = &nodes[&id];
        for (&symbol, target) in edges {
            builder.emit(label[&id], symbol, counts.probability(symbol), label[target]);
        }
    }
    Ok(builder.build()?)
}

fn unresolved(
    state: StateId,
    symbol: Symbol,
    observations: u64,
    diagnostics: &mut Vec<Diagnostic>,
) {
    tracing::warn!(
        event = event_names::TRANSITION_UNRESOLVED,
        stage = %Stage::Finalize,
        state = %state,
        symbol,
        observations,
        "observed symbol has no resolvable successor; dropped"
    );
    diagnostics.push(Diagnostic::UnresolvedTransition {
        state,
        symbol,
        observations,
    });
}

/// The one-state i.i.d. model of the symbol frequencies.
fn marginal_model(tree: &HistoryTree) -> Result<CausalStateModel, InferenceError> {
    let root = tree
        .counts(&[])
        .cloned()
        .unwrap_or_else(|| NextSymbolCounts::new(tree.alphabet().size()));
    let mut builder = CausalStateModel::builder(tree.alphabet().size())?;
    let state = builder.add_state();
    builder
        .counts(state, root.counts().to_vec())
        .histories(state, vec![History::empty()]);
    for symbol in root.support() {
        builder.emit(state, symbol, root.probability(symbol), state);
    }
    Ok(builder.build()?)
}

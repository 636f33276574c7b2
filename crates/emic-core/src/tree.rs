//! Suffix-indexed counts of next-symbol continuations.
//!
//! For every history of length `0..=max_length` that occurs in the data the
//! tree records how often each symbol followed it. A history ending at the
//! last position of a sequence has no continuation: it is counted as an
//! occurrence but contributes to no symbol count. For `h` shorter than
//! `max_length`, `occurrences(h) - sum(occurrences(children of h))` is 0 or 1
//! per inserted sequence, the 1 arising only when `h` is a prefix of it.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::alphabet::{Alphabet, History, Sequence, SequenceError, Symbol};

/// Continuation counts for one history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSymbolCounts {
    counts: Vec<u64>,
    total: u64,
}

impl NextSymbolCounts {
    pub fn new(alphabet_size: usize) -> Self {
        NextSymbolCounts {
            counts: vec![0; alphabet_size],
            total: 0,
        }
    }

    /// Build from raw counts, one entry per symbol.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        let total = counts.iter().sum();
        NextSymbolCounts { counts, total }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts.get(symbol as usize).copied().unwrap_or(0)
    }

    /// Maximum-likelihood estimate of P(symbol | history).
    pub fn probability(&self, symbol: Symbol) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.get(symbol) as f64 / self.total as f64
    }

    /// Maximum-likelihood distribution over the whole alphabet.
    pub fn probabilities(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|s| self.probability(s as Symbol))
            .collect()
    }

    /// Symbols observed at least once.
    pub fn support(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(s, _)| s as Symbol)
    }

    pub fn record(&mut self, symbol: Symbol) {
        self.counts[symbol as usize] += 1;
        self.total += 1;
    }

    pub fn merge(&mut self, other: &NextSymbolCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.total += other.total;
    }

    /// Remove counts previously merged in. Saturates at zero.
    pub fn subtract(&mut self, other: &NextSymbolCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine = mine.saturating_sub(*theirs);
        }
        self.total = self.counts.iter().sum();
    }

    /// Drop every observation of `symbol`.
    pub fn clear_symbol(&mut self, symbol: Symbol) {
        if let Some(c) = self.counts.get_mut(symbol as usize) {
            self.total -= *c;
            *c = 0;
        }
    }
}

/// A history whose continuations are too few to estimate a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("insufficient data for history {history}: {observed} continuations, need {required}")]
pub struct InsufficientData {
    pub history: History,
    pub observed: u64,
    pub required: u64,
}

#[derive(Debug, Clone)]
struct HistoryNode {
    next: NextSymbolCounts,
    occurrences: u64,
}

/// Counts of every observed history up to a fixed length.
#[derive(Debug, Clone)]
pub struct HistoryTree {
    alphabet: Alphabet,
    max_length: usize,
    min_count: u64,
    nodes: HashMap<History, HistoryNode>,
    sequence_len: usize,
}

impl HistoryTree {
    /// An empty tree over `alphabet`. Histories with fewer than `min_count`
    /// continuations are treated as unresolvable.
    pub fn new(alphabet: Alphabet, max_length: usize, min_count: u64) -> Self {
        HistoryTree {
            alphabet,
            max_length,
            min_count,
            nodes: HashMap::new(),
            sequence_len: 0,
        }
    }

    /// Build a tree from a single sequence.
    pub fn build(sequence: &Sequence, max_length: usize, min_count: u64) -> Self {
        let mut tree = HistoryTree::new(sequence.alphabet(), max_length, min_count);
        tree.insert_symbols(sequence.symbols());
        tree
    }

    /// Add the histories of another sequence. Counts accumulate; no history
    /// spans the boundary between sequences.
    pub fn insert(&mut self, sequence: &Sequence) -> Result<(), SequenceError> {
        if sequence.alphabet().size() > self.alphabet.size() {
            return Err(SequenceError::AlphabetMismatch {
                sequence: sequence.alphabet().size(),
                tree: self.alphabet.size(),
            });
        }
        self.insert_symbols(sequence.symbols());
        Ok(())
    }

    fn insert_symbols(&mut self, symbols: &[Symbol]) {
        let alphabet_size = self.alphabet.size();
        let n = symbols.len();
        for end in 0..=n {
            let next = symbols.get(end).copied();
            for len in 0..=self.max_length.min(end) {
                let key = &symbols[end - len..end];
                match self.nodes.get_mut(key) {
                    Some(node) => node.observe(next),
                    None => {
                        let mut node = HistoryNode {
                            next: NextSymbolCounts::new(alphabet_size),
                            occurrences: 0,
                        };
                        node.observe(next);
                        self.nodes.insert(History::from_slice(key), node);
                    }
                }
            }
        }
        self.sequence_len += n;
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn min_count(&self) -> u64 {
        self.min_count
    }

    /// Total number of symbols inserted.
    pub fn sequence_len(&self) -> usize {
        self.sequence_len
    }

    /// Number of distinct histories stored.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_observed(&self, history: &[Symbol]) -> bool {
        self.nodes.contains_key(history)
    }

    /// Raw continuation counts, without the `min_count` gate.
    pub fn counts(&self, history: &[Symbol]) -> Option<&NextSymbolCounts> {
        self.nodes.get(history).map(|n| &n.next)
    }

    /// How often `history` occurred, including a terminal occurrence.
    pub fn occurrences(&self, history: &[Symbol]) -> u64 {
        self.nodes.get(history).map_or(0, |n| n.occurrences)
    }

    /// Number of times `symbol` followed `history`.
    pub fn continuation_count(&self, history: &[Symbol], symbol: Symbol) -> u64 {
        self.counts(history).map_or(0, |c| c.get(symbol))
    }

    /// Continuation counts of `history`, provided at least `min_count` were seen.
    pub fn distribution(&self, history: &[Symbol]) -> Result<&NextSymbolCounts, InsufficientData> {
        match self.nodes.get(history) {
            Some(node) if node.next.total() >= self.min_count => Ok(&node.next),
            other => Err(InsufficientData {
                history: History::from_slice(history),
                observed: other.map_or(0, |n| n.next.total()),
                required: self.min_count,
            }),
        }
    }

    pub fn is_resolvable(&self, history: &[Symbol]) -> bool {
        self.distribution(history).is_ok()
    }

    /// Observed one-step extensions of `history` into the past, in symbol order.
    pub fn children(&self, history: &History) -> Vec<History> {
        self.alphabet
            .symbols()
            .map(|c| history.extend_past(c))
            .filter(|child| self.nodes.contains_key(child))
            .collect()
    }

    /// Longest length at which some history is resolvable.
    pub fn resolvable_depth(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.next.total() >= self.min_count)
            .map(|(h, _)| h.len())
            .max()
    }

    /// Every observed history of length `len`, sorted.
    pub fn histories_of_length(&self, len: usize) -> Vec<History> {
        let mut out: Vec<History> = self
            .nodes
            .keys()
            .filter(|h| h.len() == len)
            .cloned()
            .collect();
        out.sort();
        out
    }
}

impl HistoryNode {
    fn observe(&mut self, next: Option<Symbol>) {
        self.occurrences += 1;
        if let Some(symbol) = next {
            self.next.record(symbol);
        }
    }
}

//! The working partition of histories into causal states.
//!
//! States live in an arena indexed by [`StateId`]; ids are never reused, so a
//! state emptied by refinement keeps its slot. Each state owns a set of
//! frontier histories ("leaves"). Leaves never include one another as
//! suffixes: together with the histories they replaced ("retired") they form
//! a suffix trie, and the leaf that is a suffix of a word is its state.
//!
//! Transitions are read only from histories one symbol shorter than the
//! deepest leaves, whose extensions are already placed. The parents retired
//! by the latest pass stay with their old state as anchors for this purpose;
//! a leaf at full depth would reach its successor through a truncated suffix.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::alphabet::{History, Symbol};
use crate::logging::{event_names, Stage};
use crate::model::StateId;
use crate::tree::{HistoryTree, NextSymbolCounts};

use super::outcome::Diagnostic;

#[derive(Debug, Clone)]
pub(crate) struct StateSlot {
    leaves: BTreeSet<History>,
    // parents retired by the latest pass
    anchors: BTreeSet<History>,
    counts: NextSymbolCounts,
}

impl StateSlot {
    pub(crate) fn leaves(&self) -> &BTreeSet<History> {
        &self.leaves
    }

    pub(crate) fn counts(&self) -> &NextSymbolCounts {
        &self.counts
    }

    pub(crate) fn anchors(&self) -> &BTreeSet<History> {
        &self.anchors
    }

    fn is_live(&self) -> bool {
        !self.leaves.is_empty() || !self.anchors.is_empty()
    }
}

/// Where a history goes after emitting a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Successor {
    Known(StateId),
    /// The word is an internal node whose leaves span several states.
    Ambiguous {
        chosen: StateId,
        candidates: Vec<StateId>,
    },
    /// The word leaves the trie through a history that was never resolvable.
    Unknown,
}

impl Successor {
    fn target(&self) -> Option<StateId> {
        match self {
            Successor::Known(s) | Successor::Ambiguous { chosen: s, .. } => Some(*s),
            Successor::Unknown => None,
        }
    }
}

/// Successor disagreement found inside one state.
struct Split {
    state: StateId,
    symbol: Symbol,
    // successor -> (members, observations of `symbol` from them)
    groups: BTreeMap<StateId, (Vec<History>, u64)>,
}

/// Transition structure compared between passes.
pub(crate) type TransitionTable = BTreeMap<(StateId, Symbol), StateId>;

pub(crate) struct Partition<'t> {
    tree: &'t HistoryTree,
    states: Vec<StateSlot>,
    owner: HashMap<History, StateId>,
    anchored: HashMap<History, StateId>,
    retired: HashSet<History>,
    reported_ambiguous: HashSet<(History, Symbol)>,
    // length of the longest leaf
    depth: usize,
}

impl<'t> Partition<'t> {
    /// One state holding the null history.
    pub(crate) fn new(tree: &'t HistoryTree) -> Self {
        let mut partition = Partition {
            tree,
            states: Vec::new(),
            owner: HashMap::new(),
            anchored: HashMap::new(),
            retired: HashSet::new(),
            reported_ambiguous: HashSet::new(),
            depth: 0,
        };
        let root = partition.create_state();
        partition.assign(History::empty(), root);
        partition
    }

    pub(crate) fn tree(&self) -> &'t HistoryTree {
        self.tree
    }

    pub(crate) fn allocated(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn slot(&self, id: StateId) -> &StateSlot {
        &self.states[id.index()]
    }

    /// States with leaves or anchors, in ascending id order.
    pub(crate) fn live_ids(&self) -> Vec<StateId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_live())
            .map(|(i, _)| StateId::new(i))
            .collect()
    }

    /// Leaves of length `len` with their states, sorted by history.
    pub(crate) fn frontier(&self, len: usize) -> Vec<(History, StateId)> {
        let mut out: Vec<(History, StateId)> = self
            .owner
            .iter()
            .filter(|(h, _)| h.len() == len)
            .map(|(h, &s)| (h.clone(), s))
            .collect();
        out.sort();
        out
    }

    /// Pooled counts of every state with at least one observation.
    pub(crate) fn snapshot(&self) -> Vec<(StateId, Vec<u64>)> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.counts.total() > 0)
            .map(|(i, s)| (StateId::new(i), s.counts.counts().to_vec()))
            .collect()
    }

    pub(crate) fn create_state(&mut self) -> StateId {
        self.states.push(StateSlot {
            leaves: BTreeSet::new(),
            anchors: BTreeSet::new(),
            counts: NextSymbolCounts::new(self.tree.alphabet().size()),
        });
        StateId::new(self.states.len() - 1)
    }

    /// Make `history` a leaf of `state`.
    pub(crate) fn assign(&mut self, history: History, state: StateId) {
        if let Some(counts) = self.tree.counts(history.as_slice()) {
            self.states[state.index()].counts.merge(counts);
        }
        self.depth = self.depth.max(history.len());
        self.states[state.index()].leaves.insert(history.clone());
        self.owner.insert(history, state);
    }

    /// Drop the anchors of the previous pass. Call before its first retire.
    pub(crate) fn begin_level(&mut self) {
        for slot in &mut self.states {
            slot.anchors.clear();
        }
        self.anchored.clear();
    }

    /// Replace leaf `history` by its children. It stays with its state as an
    /// anchor until the next [`Partition::begin_level`].
    pub(crate) fn retire(&mut self, history: &History) {
        if let Some(state) = self.owner.remove(history) {
            self.detach(history, state);
            self.retired.insert(history.clone());
            self.states[state.index()].anchors.insert(history.clone());
            self.anchored.insert(history.clone(), state);
        }
    }

    /// Histories whose every extension is already placed: the anchors and
    /// the leaves shorter than the deepest.
    pub(crate) fn members(&self, state: StateId) -> Vec<History> {
        let slot = &self.states[state.index()];
        let short = slot.leaves.iter().filter(|h| h.len() < self.depth);
        let mut out: Vec<History> = slot.anchors.iter().chain(short).cloned().collect();
        out.sort();
        out
    }

    /// The histories a state's distribution and transitions are read from:
    /// its members, or its leaves when it has none.
    pub(crate) fn basis(&self, state: StateId) -> Vec<History> {
        let members = self.members(state);
        if members.is_empty() {
            self.states[state.index()].leaves.iter().cloned().collect()
        } else {
            members
        }
    }

    /// Pooled next-symbol counts of [`Partition::basis`].
    pub(crate) fn basis_counts(&self, state: StateId) -> NextSymbolCounts {
        let mut pooled = NextSymbolCounts::new(self.tree.alphabet().size());
        for history in self.basis(state) {
            if let Some(counts) = self.tree.counts(history.as_slice()) {
                pooled.merge(counts);
            }
        }
        pooled
    }

    fn detach(&mut self, history: &History, state: StateId) {
        let slot = &mut self.states[state.index()];
        slot.leaves.remove(history);
        if let Some(counts) = self.tree.counts(history.as_slice()) {
            slot.counts.subtract(counts);
        }
    }

    fn move_leaf(&mut self, history: &History, to: StateId) {
        if let Some(from) = self.owner.get(history).copied() {
            self.detach(history, from);
            self.assign(history.clone(), to);
        }
    }

    /// Move a member of `from` to `to`. An anchor takes along the children
    /// that were placed in its state.
    fn move_member(&mut self, history: &History, from: StateId, to: StateId) {
        if self.anchored.get(history) != Some(&from) {
            self.move_leaf(history, to);
            return;
        }
        self.states[from.index()].anchors.remove(history);
        self.states[to.index()].anchors.insert(history.clone());
        self.anchored.insert(history.clone(), to);
        let children: Vec<History> = self.states[from.index()]
            .leaves
            .iter()
            .filter(|leaf| leaf.len() == history.len() + 1 && leaf.ends_with(history.as_slice()))
            .cloned()
            .collect();
        for child in &children {
            self.move_leaf(child, to);
        }
    }

    /// The state reached from `history` after emitting `symbol`.
    pub(crate) fn successor(&self, history: &History, symbol: Symbol) -> Successor {
        let word = history.then(symbol);
        let word = word.as_slice();
        for len in 0..=word.len() {
            let suffix = &word[word.len() - len..];
            if let Some(&state) = self.owner.get(suffix) {
                return Successor::Known(state);
            }
            if !self.retired.contains(suffix) {
                return Successor::Unknown;
            }
        }
        self.resolve_internal(word)
    }

    /// Vote among the leaves below an internal node, weighted by their counts.
    fn resolve_internal(&self, word: &[Symbol]) -> Successor {
        let mut weights: BTreeMap<StateId, u64> = BTreeMap::new();
        for (leaf, &state) in &self.owner {
            if leaf.ends_with(word) {
                let weight = self.tree.counts(leaf.as_slice()).map_or(0, |c| c.total());
                *weights.entry(state).or_default() += weight;
            }
        }
        match weights.len() {
            0 => Successor::Unknown,
            1 => weights
                .keys()
                .next()
                .map_or(Successor::Unknown, |&s| Successor::Known(s)),
            _ => {
                let chosen = heaviest(&weights);
                Successor::Ambiguous {
                    chosen,
                    candidates: weights.keys().copied().collect(),
                }
            }
        }
    }

    /// The successor of `state` on `symbol`, by majority of observations
    /// over its [`Partition::basis`].
    pub(crate) fn state_successor(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        let mut weights: BTreeMap<StateId, u64> = BTreeMap::new();
        for history in self.basis(state) {
            let evidence = self.tree.continuation_count(history.as_slice(), symbol);
            if evidence == 0 {
                continue;
            }
            if let Some(target) = self.successor(&history, symbol).target() {
                *weights.entry(target).or_default() += evidence;
            }
        }
        if weights.is_empty() {
            None
        } else {
            Some(heaviest(&weights))
        }
    }

    /// Every resolved `(state, symbol) -> state` edge of the live states.
    pub(crate) fn transition_table(&self) -> TransitionTable {
        let mut table = TransitionTable::new();
        for state in self.live_ids() {
            for symbol in self.tree.alphabet().symbols() {
                if let Some(target) = self.state_successor(state, symbol) {
                    table.insert((state, symbol), target);
                }
            }
        }
        table
    }

    /// Split states until every state has one successor per symbol.
    ///
    /// Processes an explicit worklist to a fixed point and returns the number
    /// of states created. Only members are compared. Each split adds a
    /// non-empty state and states never outnumber histories, so the loop
    /// terminates.
    pub(crate) fn determinize(&mut self, diagnostics: &mut Vec<Diagnostic>) -> usize {
        let mut queue: VecDeque<StateId> = self.live_ids().into();
        let mut queued: HashSet<StateId> = queue.iter().copied().collect();
        let mut created = 0;

        while let Some(state) = queue.pop_front() {
            queued.remove(&state);
            let Some(split) = self.find_split(state, diagnostics) else {
                continue;
            };

            let successors: Vec<StateId> = split.groups.keys().copied().collect();
            let new_states = self.apply_split(&split);
            created += new_states.len();

            tracing::warn!(
                event = event_names::CONSISTENCY_VIOLATION,
                stage = %Stage::Determinize,
                state = %split.state,
                symbol = split.symbol,
                successors = ?successors,
                split_into = ?new_states,
                "histories of one state disagree on a successor; splitting"
            );
            diagnostics.push(Diagnostic::ConsistencyViolation {
                state: split.state,
                symbol: split.symbol,
                successors,
                split_into: new_states.clone(),
            });

            let mut touched = new_states;
            touched.push(state);
            let mut requeue = touched.clone();
            requeue.extend(self.predecessors_of(&touched));
            for id in requeue {
                if queued.insert(id) {
                    queue.push_back(id);
                }
            }
        }
        created
    }

    fn find_split(&mut self, state: StateId, diagnostics: &mut Vec<Diagnostic>) -> Option<Split> {
        let members = self.members(state);
        if members.len() < 2 {
            return None;
        }
        for symbol in self.tree.alphabet().symbols() {
            let mut groups: BTreeMap<StateId, (Vec<History>, u64)> = BTreeMap::new();
            for member in &members {
                let evidence = self.tree.continuation_count(member.as_slice(), symbol);
                if evidence == 0 {
                    continue;
                }
                let target = match self.successor(member, symbol) {
                    Successor::Known(t) => t,
                    Successor::Ambiguous { chosen, candidates } => {
                        self.report_ambiguous(member, symbol, chosen, candidates, diagnostics);
                        chosen
                    }
                    Successor::Unknown => continue,
                };
                let group = groups.entry(target).or_default();
                group.0.push(member.clone());
                group.1 += evidence;
            }
            if groups.len() > 1 {
                return Some(Split {
                    state,
                    symbol,
                    groups,
                });
            }
        }
        None
    }

    fn report_ambiguous(
        &mut self,
        leaf: &History,
        symbol: Symbol,
        chosen: StateId,
        candidates: Vec<StateId>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if !self.reported_ambiguous.insert((leaf.clone(), symbol)) {
            return;
        }
        tracing::warn!(
            event = event_names::AMBIGUOUS_SUCCESSOR,
            stage = %Stage::Determinize,
            history = %leaf,
            symbol,
            candidates = ?candidates,
            chosen = %chosen,
            "successor spans several states; using the best supported"
        );
        diagnostics.push(Diagnostic::AmbiguousSuccessor {
            history: leaf.clone(),
            symbol,
            candidates,
            chosen,
        });
    }

    /// The group with the most observations keeps the id; every other group
    /// moves to a fresh state. Histories without evidence on the symbol stay.
    fn apply_split(&mut self, split: &Split) -> Vec<StateId> {
        let keeper = split
            .groups
            .iter()
            .max_by(|(a_id, (_, a)), (b_id, (_, b))| a.cmp(b).then(b_id.cmp(a_id)))
            .map(|(id, _)| *id);

        let mut new_states = Vec::new();
        for (successor, (members, _)) in &split.groups {
            if Some(*successor) == keeper {
                continue;
            }
            let id = self.create_state();
            for member in members {
                self.move_member(member, split.state, id);
            }
            tracing::debug!(
                event = event_names::STATE_SPLIT,
                stage = %Stage::Determinize,
                from = %split.state,
                into = %id,
                histories = members.len(),
                "state split"
            );
            new_states.push(id);
        }
        new_states
    }

    /// Live states with a member whose successor is one of `targets`.
    fn predecessors_of(&self, targets: &[StateId]) -> Vec<StateId> {
        let symbols: Vec<Symbol> = self.tree.alphabet().symbols().collect();
        self.live_ids()
            .into_iter()
            .filter(|&state| {
                self.members(state).iter().any(|member| {
                    symbols.iter().any(|&symbol| {
                        self.tree.continuation_count(member.as_slice(), symbol) > 0
                            && self
                                .successor(member, symbol)
                                .target()
                                .is_some_and(|t| targets.contains(&t))
                    })
                })
            })
            .collect()
    }
}

/// Key with the largest weight; ties go to the lowest id.
fn heaviest(weights: &BTreeMap<StateId, u64>) -> StateId {
    let mut best: Option<(StateId, u64)> = None;
    for (&id, &w) in weights {
        match best {
            Some((_, bw)) if w <= bw => {}
            _ => best = Some((id, w)),
        }
    }
    best.map_or(StateId::new(0), |(id, _)| id)
}

//! Stage and event names attached to structured log records.
//!
//! Every record emitted by the engine carries an `event` field drawn from
//! [`event_names`] and a `stage` field, so JSON output can be filtered
//! without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages of an inference run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Counting histories.
    Tree,
    /// Assigning histories to states by distribution.
    Homogenize,
    /// Splitting states until transitions are deterministic.
    Determinize,
    /// Pruning transients and assembling the model.
    Finalize,
    /// Computing information-theoretic measures.
    Metrics,
    /// Sampling synthetic sequences.
    Source,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Tree => "tree",
            Stage::Homogenize => "homogenize",
            Stage::Determinize => "determinize",
            Stage::Finalize => "finalize",
            Stage::Metrics => "metrics",
            Stage::Source => "source",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const INFER_STARTED: &str = "infer.started";
    pub const INFER_FINISHED: &str = "infer.finished";

    // Tree stage
    pub const TREE_BUILT: &str = "infer.tree_built";
    pub const DEPTH_LIMITED: &str = "infer.depth_limited";

    // Refinement passes
    pub const PASS_FINISHED: &str = "infer.pass_finished";
    pub const STATE_CREATED: &str = "infer.state_created";
    pub const DATA_INSUFFICIENT: &str = "infer.data_insufficient";
    pub const AMBIGUOUS_ASSIGNMENT: &str = "infer.ambiguous_assignment";

    // Determinization
    pub const STATE_SPLIT: &str = "infer.state_split";
    pub const CONSISTENCY_VIOLATION: &str = "infer.consistency_violation";
    pub const AMBIGUOUS_SUCCESSOR: &str = "infer.ambiguous_successor";

    // Finalization
    pub const TRANSIENTS_REMOVED: &str = "infer.transients_removed";
    pub const TRANSITION_UNRESOLVED: &str = "infer.transition_unresolved";
    pub const NON_CONVERGENCE: &str = "infer.non_convergence";

    // Other components
    pub const METRICS_COMPUTED: &str = "metrics.computed";
    pub const BELIEFS_TRUNCATED: &str = "metrics.beliefs_truncated";
    pub const SOURCE_GENERATED: &str = "source.generated";
}

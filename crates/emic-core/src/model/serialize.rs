//! JSON persistence for models.
//!
//! The document format is plain data: per-state `symbol -> probability` maps
//! over the support plus an explicit transition list. Decoding runs the full builder
//! validation, so a document that round-trips is always a valid model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CausalStateModel, ModelError, StateId, MODEL_SCHEMA_VERSION};
use crate::alphabet::{History, Symbol};

/// Serialized form of a [`CausalStateModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDocument {
    pub schema_version: String,
    pub alphabet_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_state: Option<u32>,
    pub states: Vec<StateDocument>,
    pub transitions: Vec<TransitionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateDocument {
    pub id: u32,
    /// P(symbol | state) for every symbol the state emits.
    pub distribution: BTreeMap<Symbol, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u64>>,
    /// Member histories, oldest symbol first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histories: Vec<Vec<Symbol>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionDocument {
    pub from: u32,
    pub symbol: Symbol,
    pub to: u32,
}

/// JSON Schema describing [`ModelDocument`].
pub fn model_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ModelDocument)).unwrap_or(serde_json::Value::Null)
}

impl CausalStateModel {
    pub fn to_document(&self) -> ModelDocument {
        let states = self
            .states
            .iter()
            .map(|s| StateDocument {
                id: s.id.index() as u32,
                distribution: s
                    .support()
                    .map(|symbol| (symbol, s.probability(symbol)))
                    .collect(),
                counts: s.counts.clone(),
                histories: s.histories.iter().map(|h| h.as_slice().to_vec()).collect(),
            })
            .collect();
        let transitions = self
            .state_ids()
            .flat_map(|from| {
                self.transitions_from(from)
                    .into_iter()
                    .map(move |(symbol, to)| TransitionDocument {
                        from: from.index() as u32,
                        symbol,
                        to: to.index() as u32,
                    })
            })
            .collect();
        ModelDocument {
            schema_version: MODEL_SCHEMA_VERSION.to_string(),
            alphabet_size: self.alphabet.size(),
            start_state: self.start.map(|s| s.index() as u32),
            states,
            transitions,
        }
    }

    pub fn from_document(doc: &ModelDocument) -> Result<Self, ModelError> {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        if major(&doc.schema_version) != major(MODEL_SCHEMA_VERSION) {
            return Err(ModelError::Serialization(format!(
                "unsupported model schema version {} (expected {})",
                doc.schema_version, MODEL_SCHEMA_VERSION
            )));
        }

        let mut states: Vec<&StateDocument> = doc.states.iter().collect();
        states.sort_by_key(|s| s.id);
        if states.iter().enumerate().any(|(i, s)| s.id as usize != i) {
            return Err(ModelError::InvalidModel(
                "state ids must be exactly 0..n".to_string(),
            ));
        }

        let mut builder = CausalStateModel::builder(doc.alphabet_size)?;
        for state in &states {
            let id = builder.add_state();
            if let Some(counts) = &state.counts {
                builder.counts(id, counts.clone());
            }
            builder.histories(
                id,
                state
                    .histories
                    .iter()
                    .map(|h| History::from_slice(h))
                    .collect(),
            );
        }

        for t in &doc.transitions {
            let probability = states
                .get(t.from as usize)
                .and_then(|s| s.distribution.get(&t.symbol))
                .copied()
                .unwrap_or(f64::NAN);
            builder.emit(
                StateId::new(t.from as usize),
                t.symbol,
                probability,
                StateId::new(t.to as usize),
            );
        }
        if let Some(start) = doc.start_state {
            builder.start(StateId::new(start as usize));
        }
        let model = builder.build()?;

        // Every listed probability must belong to a transition.
        for (state, doc_state) in model.states.iter().zip(&states) {
            if doc_state.distribution.len() != state.support().count() {
                return Err(ModelError::InvalidModel(format!(
                    "state {} lists probabilities for symbols without transitions",
                    doc_state.id
                )));
            }
        }
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let doc: ModelDocument =
            serde_json::from_str(json).map_err(|e| ModelError::Serialization(e.to_string()))?;
        CausalStateModel::from_document(&doc)
    }
}

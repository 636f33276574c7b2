//! Named starting points between merging and splitting.
//!
//! Lower significance and larger minimum counts make the engine slower to
//! split histories into new states; longer histories let it see deeper
//! memory at the cost of data per history.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::inference::{InferenceConfig, TestKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// α = 0.001, at least 50 observations per history
    Coarse,
    /// The defaults of [`InferenceConfig`]
    Standard,
    /// α = 0.1, at least 10 observations per history
    Fine,
    /// Histories up to 10 symbols
    Exhaustive,
}

struct Preset {
    name: PresetName,
    aliases: &'static [&'static str],
    description: &'static str,
    max_history_length: usize,
    significance_level: f64,
    min_count: u64,
}

const PRESETS: [Preset; 4] = [
    Preset {
        name: PresetName::Coarse,
        aliases: &["coarse", "strict"],
        description: "few well-supported states; borderline histories merge",
        max_history_length: 4,
        significance_level: 0.001,
        min_count: 50,
    },
    Preset {
        name: PresetName::Standard,
        aliases: &["standard", "default"],
        description: "α 0.05, 20 observations, histories up to 5 symbols",
        max_history_length: 5,
        significance_level: 0.05,
        min_count: 20,
    },
    Preset {
        name: PresetName::Fine,
        aliases: &["fine", "sensitive"],
        description: "more states; borderline histories split",
        max_history_length: 6,
        significance_level: 0.1,
        min_count: 10,
    },
    Preset {
        name: PresetName::Exhaustive,
        aliases: &["exhaustive", "deep"],
        description: "histories up to 10 symbols for long-memory processes",
        max_history_length: 10,
        significance_level: 0.05,
        min_count: 20,
    },
];

impl PresetName {
    pub const ALL: &'static [PresetName] = &[
        PresetName::Coarse,
        PresetName::Standard,
        PresetName::Fine,
        PresetName::Exhaustive,
    ];

    fn entry(self) -> &'static Preset {
        // PRESETS lists the variants in declaration order
        &PRESETS[self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        self.entry().aliases[0]
    }

    /// Case-insensitive; accepts the canonical name or an alias.
    pub fn parse(s: &str) -> Option<PresetName> {
        PRESETS
            .iter()
            .find(|p| p.aliases.iter().any(|a| a.eq_ignore_ascii_case(s.trim())))
            .map(|p| p.name)
    }

    pub fn description(&self) -> &'static str {
        self.entry().description
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

#[derive(Debug, Clone, Error)]
pub enum PresetError {
    #[error("unknown preset '{0}' (expected coarse, standard, fine or exhaustive)")]
    UnknownPreset(String),
}

pub fn get_preset(name: PresetName) -> InferenceConfig {
    let preset = name.entry();
    InferenceConfig {
        max_history_length: preset.max_history_length,
        significance_level: preset.significance_level,
        min_count: preset.min_count,
        test: TestKind::ChiSquared,
        parallel: true,
    }
}

/// A preset together with the configuration it expands to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub config: InferenceConfig,
}

pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo {
            name,
            description: name.description().to_string(),
            config: get_preset(name),
        })
        .collect()
}

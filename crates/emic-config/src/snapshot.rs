//! Frozen record of the settings a run used.
//!
//! Persisted models carry one, so a model can be matched to the exact
//! configuration that inferred it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::inference::InferenceConfig;
use crate::resolve::{ConfigSource, ResolvedConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub schema_version: String,
    pub config: InferenceConfig,
    /// Display form of the [`ConfigSource`].
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Hex SHA-256 of `config` as JSON.
    pub fingerprint: String,
}

impl ConfigSnapshot {
    /// For configurations built in code rather than resolved from disk.
    pub fn of(config: &InferenceConfig) -> Self {
        ConfigSnapshot {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            config: config.clone(),
            source: ConfigSource::BuiltinDefault.to_string(),
            path: None,
            fingerprint: fingerprint(config),
        }
    }

    pub fn from_resolved(resolved: &ResolvedConfig) -> Self {
        ConfigSnapshot {
            source: resolved.source.to_string(),
            path: resolved.path.as_deref().map(|p| p.display().to_string()),
            ..Self::of(&resolved.config)
        }
    }

    /// Equal fingerprints; provenance is ignored.
    pub fn same_settings(&self, other: &ConfigSnapshot) -> bool {
        self.fingerprint == other.fingerprint
    }
}

/// Field order is fixed by the struct, so the JSON form is canonical.
pub fn fingerprint(config: &InferenceConfig) -> String {
    let digest = match serde_json::to_vec(config) {
        Ok(bytes) => Sha256::digest(bytes),
        Err(_) => Sha256::digest(b""),
    };
    hex::encode(digest)
}

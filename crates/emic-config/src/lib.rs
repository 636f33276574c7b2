//! emic configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`InferenceConfig`] record passed into every inference run
//! - Named presets trading merge/split sensitivity
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots that fingerprint the exact settings of a run

pub mod inference;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use inference::{ConfigFile, InferenceConfig, TestKind};
pub use preset::{get_preset, PresetName};
pub use resolve::{resolve_config, ConfigSource, ResolvedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

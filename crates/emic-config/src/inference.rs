//! The inference configuration record and its on-disk file form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::preset::PresetName;
use crate::validate::{ValidationError, ValidationResult};

/// Which distinguishability test compares next-symbol distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pearson chi-squared homogeneity test.
    #[default]
    ChiSquared,
    /// Two-sample Kolmogorov-Smirnov test over symbol order.
    KolmogorovSmirnov,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::ChiSquared => "chi_squared",
            TestKind::KolmogorovSmirnov => "kolmogorov_smirnov",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chi_squared" | "chi-squared" | "chi2" | "chisq" => Ok(TestKind::ChiSquared),
            "kolmogorov_smirnov" | "kolmogorov-smirnov" | "ks" => Ok(TestKind::KolmogorovSmirnov),
            _ => Err(ValidationError::InvalidValue {
                field: "test".to_string(),
                message: format!("unknown distinguishability test '{}'", s),
            }),
        }
    }
}

/// Immutable settings for one inference run.
///
/// Passed by reference into the engine; nothing here is process-global, so
/// concurrent runs with different settings never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Longest history (in symbols) the engine may condition on.
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// Significance level α of the distinguishability test.
    /// Lower values merge more histories (coarser machines).
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Minimum number of continuations before a history takes part in a test.
    #[serde(default = "default_min_count")]
    pub min_count: u64,

    /// Distinguishability test used for every comparison.
    #[serde(default)]
    pub test: TestKind,

    /// Run candidate tests of a pass on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_max_history_length() -> usize {
    5
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_min_count() -> u64 {
    20
}

fn default_parallel() -> bool {
    true
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_history_length: default_max_history_length(),
            significance_level: default_significance_level(),
            min_count: default_min_count(),
            test: TestKind::default(),
            parallel: default_parallel(),
        }
    }
}

impl InferenceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        crate::validate::validate_inference(self)
    }

    pub fn with_max_history_length(mut self, length: usize) -> Self {
        self.max_history_length = length;
        self
    }

    pub fn with_significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = alpha;
        self
    }

    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_test(mut self, test: TestKind) -> Self {
        self.test = test;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Apply the non-empty fields of a config file on top of this config.
    pub fn apply_overrides(&mut self, file: &ConfigFile) {
        if let Some(v) = file.max_history_length {
            self.max_history_length = v;
        }
        if let Some(v) = file.significance_level {
            self.significance_level = v;
        }
        if let Some(v) = file.min_count {
            self.min_count = v;
        }
        if let Some(v) = file.test {
            self.test = v;
        }
        if let Some(v) = file.parallel {
            self.parallel = v;
        }
    }
}

/// On-disk configuration: an optional preset plus field overrides.
///
/// Accepted as JSON (`.json`) or TOML (anything else):
///
/// ```toml
/// schema_version = "1.0.0"
/// preset = "fine"
/// min_count = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub preset: Option<PresetName>,
    #[serde(default)]
    pub max_history_length: Option<usize>,
    #[serde(default)]
    pub significance_level: Option<f64>,
    #[serde(default)]
    pub min_count: Option<u64>,
    #[serde(default)]
    pub test: Option<TestKind>,
    #[serde(default)]
    pub parallel: Option<bool>,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl ConfigFile {
    /// Load a config file, choosing the parser by extension.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse a config file from JSON.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a config file from TOML.
    pub fn from_toml_str(text: &str) -> ValidationResult<Self> {
        toml::from_str(text)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Materialize the effective configuration: preset (or defaults), then overrides.
    pub fn to_config(&self) -> ValidationResult<InferenceConfig> {
        crate::validate::validate_schema_version(&self.schema_version)?;
        let mut config = match self.preset {
            Some(preset) => crate::preset::get_preset(preset),
            None => InferenceConfig::default(),
        };
        config.apply_overrides(self);
        config.validate()?;
        Ok(config)
    }
}

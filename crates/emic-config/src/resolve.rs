//! Finding the config file and layering environment overrides on top.
//!
//! The first of these that names an existing file wins: an explicit path,
//! `EMIC_CONFIG`, `$XDG_CONFIG_HOME/emic/config.toml`. Without one the
//! defaults apply. Per-field `EMIC_*` variables are applied last.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::inference::{ConfigFile, InferenceConfig};
use crate::validate::{ValidationError, ValidationResult};

pub const ENV_CONFIG_PATH: &str = "EMIC_CONFIG";
pub const ENV_MAX_HISTORY: &str = "EMIC_MAX_HISTORY";
pub const ENV_SIGNIFICANCE: &str = "EMIC_SIGNIFICANCE";
pub const ENV_MIN_COUNT: &str = "EMIC_MIN_COUNT";
pub const ENV_TEST: &str = "EMIC_TEST";

const APP_DIR: &str = "emic";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    /// Named by `EMIC_CONFIG`.
    Environment,
    XdgConfig,
    #[default]
    BuiltinDefault,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::Explicit => "explicit path",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::BuiltinDefault => "builtin default",
        })
    }
}

/// The effective configuration and the file it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: InferenceConfig,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
}

pub fn resolve_config(explicit: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    resolve_config_with(explicit, |key| std::env::var(key).ok())
}

/// [`resolve_config`] with the environment read through `lookup`.
pub fn resolve_config_with(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> ValidationResult<ResolvedConfig> {
    let (mut config, source, path) = match locate(explicit, &lookup) {
        Some((path, source)) => {
            let config = ConfigFile::from_file(&path)?.to_config()?;
            tracing::debug!(path = %path.display(), %source, "config.loaded");
            (config, source, Some(path))
        }
        None => (InferenceConfig::default(), ConfigSource::BuiltinDefault, None),
    };

    apply_env_overrides_with(&mut config, &lookup)?;
    config.validate()?;
    Ok(ResolvedConfig {
        config,
        source,
        path,
    })
}

/// An explicit path is returned even when missing, so loading it reports
/// the I/O error; the other locations are skipped unless the file exists.
fn locate(
    explicit: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<(PathBuf, ConfigSource)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), ConfigSource::Explicit));
    }
    let from_env = lookup(ENV_CONFIG_PATH).map(|p| (PathBuf::from(p), ConfigSource::Environment));
    let from_xdg = xdg_config_dir().map(|d| (d.join(CONFIG_FILENAME), ConfigSource::XdgConfig));
    [from_env, from_xdg]
        .into_iter()
        .flatten()
        .find(|(path, _)| path.is_file())
}

/// Overwrite fields of `config` named by the `EMIC_*` variables.
pub fn apply_env_overrides_with(
    config: &mut InferenceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ValidationResult<()> {
    override_from(&lookup, ENV_MAX_HISTORY, &mut config.max_history_length)?;
    override_from(&lookup, ENV_SIGNIFICANCE, &mut config.significance_level)?;
    override_from(&lookup, ENV_MIN_COUNT, &mut config.min_count)?;
    override_from(&lookup, ENV_TEST, &mut config.test)?;
    Ok(())
}

fn override_from<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) -> ValidationResult<()>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *field = raw
            .trim()
            .parse()
            .map_err(|e| ValidationError::invalid(key, format!("cannot parse '{raw}': {e}")))?;
    }
    Ok(())
}

/// `<config dir>/emic`, when the platform has a config directory.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

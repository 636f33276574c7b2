//! Where log output goes and how much of it there is.
//!
//! Resolution order, last wins:
//! 1. defaults (human format, `info`)
//! 2. `RUST_LOG` (only when `EMIC_LOG` is unset)
//! 3. `EMIC_LOG`, `EMIC_LOG_FORMAT`
//! 4. explicit values from the embedding application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

pub const ENV_LOG: &str = "EMIC_LOG";
pub const ENV_LOG_FORMAT: &str = "EMIC_LOG_FORMAT";
const ENV_RUST_LOG: &str = "RUST_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// JSON lines, for collection by other tools.
    Json,
}

const FORMAT_NAMES: &[(&str, LogFormat)] = &[
    ("human", LogFormat::Human),
    ("pretty", LogFormat::Human),
    ("json", LogFormat::Json),
    ("jsonl", LogFormat::Json),
];

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(FORMAT_NAMES, s).ok_or_else(|| format!("unknown log format '{s}'"))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Json => "json",
        })
    }
}

/// Verbosity, ordered from most to least output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every history assignment and tree statistic.
    Trace,
    /// State creation and deferred histories.
    Debug,
    /// Run boundaries and pass summaries.
    #[default]
    Info,
    /// Splits, ambiguities and non-convergence only.
    Warn,
    Error,
    Off,
}

const LEVEL_NAMES: &[(&str, LogLevel)] = &[
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("error", LogLevel::Error),
    ("off", LogLevel::Off),
    ("quiet", LogLevel::Off),
];

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }

    /// The most verbose level named in a `RUST_LOG`-style directive list,
    /// e.g. `warn,emic_core=debug` gives `Debug`.
    fn from_directives(directives: &str) -> Option<LogLevel> {
        directives
            .split(',')
            .filter_map(|d| d.rsplit('=').next())
            .filter_map(|name| lookup_name(LEVEL_NAMES, name.trim()))
            .min()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(LEVEL_NAMES, s).ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = LEVEL_NAMES
            .iter()
            .find(|(_, level)| level == self)
            .map_or("info", |(name, _)| name);
        f.write_str(name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.as_filter()
    }
}

fn lookup_name<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| *value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Prefix human output with timestamps.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::default(),
            level: LogLevel::default(),
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment, then apply explicit values.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), level, format)
    }

    /// [`LogConfig::from_env`] with the environment read through `lookup`.
    /// Unparseable values are ignored.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        level: Option<LogLevel>,
        format: Option<LogFormat>,
    ) -> Self {
        let env_level = match lookup(ENV_LOG) {
            Some(value) => value.parse().ok(),
            None => lookup(ENV_RUST_LOG).and_then(|v| LogLevel::from_directives(&v)),
        };
        let env_format = lookup(ENV_LOG_FORMAT).and_then(|v| v.parse().ok());

        let defaults = LogConfig::default();
        LogConfig {
            level: level.or(env_level).unwrap_or(defaults.level),
            format: format.or(env_format).unwrap_or(defaults.format),
            timestamps: defaults.timestamps,
        }
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        LogConfig { format, ..self }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        LogConfig { level, ..self }
    }

    pub fn with_timestamps(self, timestamps: bool) -> Self {
        LogConfig { timestamps, ..self }
    }
}

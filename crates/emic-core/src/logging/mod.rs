//! Structured logging for emic.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application, which may call [`init_logging`] once at
//! startup.
//!
//! # Usage
//!
//! ```no_run
//! use emic_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! ```
//!
//! - stderr receives all log output (human or JSON lines)
//! - every engine record carries `event` and `stage` fields
//! - an inference run is wrapped in an `infer` span

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` directives are used as written unless `EMIC_LOG` is set;
/// otherwise records at the configured level and above pass.
fn filter_for(config: &LogConfig) -> EnvFilter {
    let by_level = || EnvFilter::default().add_directive(config.level.as_filter().into());
    if std::env::var_os(self::config::ENV_LOG).is_some() {
        return by_level();
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| by_level())
}

/// Install a global stderr subscriber for `config`.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let human = config.format == LogFormat::Human;
    let ansi = std::io::stderr().is_terminal();

    let timed = (human && config.timestamps).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(ansi)
    });
    let untimed = (human && !config.timestamps).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(ansi)
            .without_time()
    });
    let json = (!human).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
    });

    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(timed)
        .with(untimed)
        .with(json)
        .try_init()
        .is_ok()
}

/// [`init_logging`] with settings read from the environment.
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_human_at_info() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.timestamps);
    }

    #[test]
    fn second_init_is_rejected() {
        let config = LogConfig::default().with_level(LogLevel::Off);
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}

//! Logging setup shared by every eventflow binary.
//!
//! ```ignore
//! use eventflow_core::tracing::{init_tracing, TracingConfig};
//!
//! let config = if debug { TracingConfig::cli_debug() } else { TracingConfig::cli() };
//! init_tracing(config)?;
//! ```
//!
//! `RUST_LOG` always wins over the configured level.

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Target prefix shared by all eventflow crates.
const TARGET_PREFIX: &str = "eventflow";

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("unknown log format `{0}`, expected pretty, compact or json")]
    UnknownFormat(String),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(TracingError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to eventflow targets.
    pub level: Level,
    pub format: LogFormat,
    /// Show source file and line.
    pub with_location: bool,
    pub with_timestamp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Quiet CLI output: warnings and errors only, no timestamps.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            with_location: false,
            with_timestamp: false,
        }
    }

    /// Verbose CLI output for `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            with_location: true,
            ..Self::cli()
        }
    }

    /// Switches the renderer. JSON lines always carry a timestamp.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        if format == LogFormat::Json {
            self.with_timestamp = true;
        }
        self
    }

    /// The filter directive used when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        format!("{}={}", TARGET_PREFIX, self.level)
    }
}

/// Installs the global subscriber. Call once, early in `main`.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.is_empty() => EnvFilter::try_new(from_env)?,
        _ => EnvFilter::try_new(config.directive())?,
    };

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact if config.with_timestamp => fmt::layer()
            .compact()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

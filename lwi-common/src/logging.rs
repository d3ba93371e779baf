//! Log level selection and tracing initialization
//!
//! The legacy tools took a single-letter verbosity (`D`, `I`, `W`, `E`).
//! [`LogLevel`] accepts those letters as well as the usual level names and
//! maps them onto `tracing` filters. The subscriber is installed once at
//! startup; library code only ever calls the `tracing` macros.

use crate::{Error, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target for messages that must be emitted at every verbosity
/// (run banners and the final summary).
pub const ALWAYS_TARGET: &str = "lwi_always";

/// Verbosity threshold for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    /// Errors only (the legacy default)
    #[default]
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level filter
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }

    /// Filter directives for this level, keeping the always-on target enabled
    pub fn filter_directives(self) -> String {
        let level = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        };
        format!("{},{}=info", level, ALWAYS_TARGET)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warning => "W",
            LogLevel::Error => "E",
        };
        f.write_str(letter)
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "debug" | "trace" => Ok(LogLevel::Debug),
            "i" | "info" => Ok(LogLevel::Info),
            "w" | "warn" | "warning" => Ok(LogLevel::Warning),
            "e" | "error" => Ok(LogLevel::Error),
            other => Err(Error::InvalidInput(format!(
                "logging level must be D|I|W|E (got '{}')",
                other
            ))),
        }
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr, or are appended to `log_file` when one is given.
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_tracing(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directives()));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("Cannot open log file {}: {}", path.display(), e))
                })?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

//! Configuration loading and setting resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and defaults are
//! used. A TOML file that exists but cannot be parsed is a configuration error.

use crate::{Error, LogLevel, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory name used under the platform config/data folders
const APP_DIR: &str = "lwi";

/// Label the destination system uses for institution-only access
pub const DEFAULT_INSTITUTIONAL_VISIBILITY: &str = "uva";

/// E-mail suffix stripped from institutional identifiers
pub const DEFAULT_INSTITUTION_EMAIL_SUFFIX: &str = "@virginia.edu";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Namespace for created objects
    #[serde(default)]
    pub namespace: Option<String>,

    /// Directory containing one sub-directory per exported item
    #[serde(default)]
    pub import_dir: Option<PathBuf>,

    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Replacement for the legacy "authenticated" visibility label
    #[serde(default)]
    pub institutional_visibility: Option<String>,

    /// Suffix removed from computing identifiers (e.g. "@virginia.edu")
    #[serde(default)]
    pub institution_email_suffix: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (D|I|W|E or debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Compiled defaults used when no other source supplies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub database_path: PathBuf,
    pub log_level: LogLevel,
    pub institutional_visibility: String,
    pub institution_email_suffix: String,
}

impl CompiledDefaults {
    /// Defaults for the platform we are running on
    pub fn for_current_platform() -> Self {
        Self {
            database_path: default_data_folder().join("objects.db"),
            log_level: LogLevel::default(),
            institutional_visibility: DEFAULT_INSTITUTIONAL_VISIBILITY.to_string(),
            institution_email_suffix: DEFAULT_INSTITUTION_EMAIL_SUFFIX.to_string(),
        }
    }
}

/// Default TOML config path for a module, e.g. `~/.config/lwi/lwi-import.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(format!("{}.toml", module_name)))
}

/// Load TOML config, falling back to defaults when the file does not exist
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    match read_toml_config(path)? {
        Some(config) => Ok(config),
        None => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(TomlConfig::default())
        }
    }
}

/// Read TOML config without logging; `None` when the file does not exist
///
/// For callers that load config before a subscriber is installed.
pub fn read_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    Ok(Some(config))
}

/// Resolve a single string setting
///
/// Empty values at any tier are ignored so that `FOO=` does not mask a
/// configured value.
pub fn resolve_value(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg.filter(|v| !v.trim().is_empty()) {
        return Some(value.to_string());
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }

    // Priority 3: TOML config file
    toml_value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
}

/// Resolve the SQLite database path (CLI → ENV → TOML → compiled default)
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    let cli = cli_arg.map(|p| p.to_string_lossy().to_string());
    let toml = toml_config
        .database_path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string());

    resolve_value(cli.as_deref(), env_var_name, toml.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().database_path)
}

/// Resolve the log level (CLI → ENV → TOML → compiled default)
pub fn resolve_log_level(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> Result<LogLevel> {
    match resolve_value(cli_arg, env_var_name, toml_config.logging.level.as_deref()) {
        Some(level) => level.parse(),
        None => Ok(CompiledDefaults::for_current_platform().log_level),
    }
}

/// Get OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./lwi_data"))
}

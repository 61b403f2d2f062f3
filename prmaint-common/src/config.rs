//! Configuration loading and config file resolution
//!
//! Configuration is a small TOML bootstrap file. Every field is optional and
//! falls back to a built-in default, so running without any config file is
//! the normal case.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`PRMAINT_CONFIG`)
//! 3. Platform config directory (`<config dir>/prmaint/config.toml`), if present
//! 4. No file: compiled defaults
//!
//! A file named explicitly (tiers 1-2) must exist and parse. A missing file at
//! tier 3 only falls through to the defaults.
//!
//! # Example
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [dedup]
//! extra_identifiers = ["release-bot"]
//! canonical_strategy = "latest"
//! closure_reason = "duplicate-ai-assignee"
//! ```

use crate::maintenance::{
    CanonicalStrategy, CloseDuplicateOptions, DEFAULT_CLOSURE_REASON, DEFAULT_HUMAN_CLOSURE_REASON,
};
use crate::ownership::DEFAULT_AI_IDENTIFIERS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PRMAINT_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dedup: DedupConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Duplicate closing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Replaces the default automation identifiers when set
    #[serde(default)]
    pub identifiers: Option<Vec<String>>,

    /// Appended to the (default or replaced) identifiers
    #[serde(default)]
    pub extra_identifiers: Vec<String>,

    #[serde(default)]
    pub canonical_strategy: CanonicalStrategy,

    #[serde(default = "default_closure_reason")]
    pub closure_reason: String,

    #[serde(default = "default_true")]
    pub require_automation_owner: bool,

    #[serde(default = "default_human_closure_reason")]
    pub human_closure_reason: String,

    #[serde(default)]
    pub fold_diacritics: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            identifiers: None,
            extra_identifiers: Vec::new(),
            canonical_strategy: CanonicalStrategy::default(),
            closure_reason: default_closure_reason(),
            require_automation_owner: true,
            human_closure_reason: default_human_closure_reason(),
            fold_diacritics: false,
        }
    }
}

impl DedupConfig {
    /// Identifier list after applying replacement and extension
    pub fn effective_identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = match &self.identifiers {
            Some(list) => list.clone(),
            None => DEFAULT_AI_IDENTIFIERS.iter().map(|s| s.to_string()).collect(),
        };
        identifiers.extend(self.extra_identifiers.iter().cloned());
        identifiers
    }

    /// Build closer options from this configuration (no observer attached)
    pub fn to_options<'a>(&self) -> CloseDuplicateOptions<'a> {
        CloseDuplicateOptions::default()
            .with_identifiers(self.effective_identifiers())
            .with_strategy(self.canonical_strategy)
            .with_closure_reason(self.closure_reason.clone())
            .with_require_automation_owner(self.require_automation_owner)
            .with_human_closure_reason(self.human_closure_reason.clone())
            .with_fold_diacritics(self.fold_diacritics)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_closure_reason() -> String {
    DEFAULT_CLOSURE_REASON.to_string()
}

fn default_human_closure_reason() -> String {
    DEFAULT_HUMAN_CLOSURE_REASON.to_string()
}

fn default_true() -> bool {
    true
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    PlatformDefault(PathBuf),
    /// Platform config file existed but failed to load; defaults are in effect
    IgnoredPlatformDefault { path: PathBuf, reason: String },
    CompiledDefaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::PlatformDefault(p) => Some(p.as_path()),
            ConfigSource::IgnoredPlatformDefault { .. } | ConfigSource::CompiledDefaults => None,
        }
    }
}

/// Resolve which config file (if any) to load, following the priority order
pub fn resolve_config_source(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    if let Some(path) = platform_config_path() {
        if path.exists() {
            return ConfigSource::PlatformDefault(path);
        }
    }

    // Priority 4: Compiled defaults
    ConfigSource::CompiledDefaults
}

/// `<config dir>/prmaint/config.toml` for the current platform
pub fn platform_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("prmaint").join("config.toml"))
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    Ok(toml::from_str(content)?)
}

/// Load a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    parse_toml_config(&content)
}

/// Resolve and load configuration.
///
/// Explicitly requested files (CLI or environment) must load. An unreadable
/// platform default falls back to the compiled defaults and is reported as
/// [`ConfigSource::IgnoredPlatformDefault`] so the caller can log it once its
/// subscriber is installed.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let source = resolve_config_source(cli_arg);
    match source {
        ConfigSource::CommandLine(ref path) | ConfigSource::Environment(ref path) => {
            let config = load_toml_config(path)?;
            Ok((config, source))
        }
        ConfigSource::PlatformDefault(path) => match load_toml_config(&path) {
            Ok(config) => Ok((config, ConfigSource::PlatformDefault(path))),
            Err(e) => Ok((
                TomlConfig::default(),
                ConfigSource::IgnoredPlatformDefault {
                    path,
                    reason: e.to_string(),
                },
            )),
        },
        other => Ok((TomlConfig::default(), other)),
    }
}

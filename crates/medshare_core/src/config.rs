//! Share view configuration.
//!
//! # Responsibility
//! - Hold per-read time budgets and logging settings.
//! - Load them from TOML and environment overrides.
//!
//! # Invariants
//! - Timeouts lie in `1..=MAX_TIMEOUT_MS` after `validate`.
//! - `log_dir`, when set, is absolute.

use crate::logging::parse_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TOKEN_LOOKUP_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_CATEGORY_FETCH_TIMEOUT_MS: u64 = 2_000;

/// Largest per-read budget; SQLite takes busy timeouts as a C `int` of ms.
pub const MAX_TIMEOUT_MS: u64 = i32::MAX as u64;

pub const ENV_TOKEN_TIMEOUT_MS: &str = "MEDSHARE_TOKEN_TIMEOUT_MS";
pub const ENV_CATEGORY_TIMEOUT_MS: &str = "MEDSHARE_CATEGORY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "MEDSHARE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MEDSHARE_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Runtime settings for one share view process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareViewConfig {
    /// Budget for the single token lookup.
    pub token_lookup_timeout_ms: u64,
    /// Budget for each category read, applied independently.
    pub category_fetch_timeout_ms: u64,
    /// One of `trace|debug|info|warn|error`; build default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging is off when absent.
    pub log_dir: Option<PathBuf>,
}

impl Default for ShareViewConfig {
    fn default() -> Self {
        Self {
            token_lookup_timeout_ms: DEFAULT_TOKEN_LOOKUP_TIMEOUT_MS,
            category_fetch_timeout_ms: DEFAULT_CATEGORY_FETCH_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl ShareViewConfig {
    /// Reads, parses and validates a TOML config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `MEDSHARE_*` environment overrides, then validates.
    pub fn merge_with_env(&mut self) -> ConfigResult<()> {
        self.merge_with_vars(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, then validates.
    pub fn merge_with_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(value) = lookup(ENV_TOKEN_TIMEOUT_MS) {
            self.token_lookup_timeout_ms = parse_millis(ENV_TOKEN_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_CATEGORY_TIMEOUT_MS) {
            self.category_fetch_timeout_ms = parse_millis(ENV_CATEGORY_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(value);
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        self.validate()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_timeout("token_lookup_timeout_ms", self.token_lookup_timeout_ms)?;
        check_timeout("category_fetch_timeout_ms", self.category_fetch_timeout_ms)?;
        if let Some(level) = &self.log_level {
            parse_level(level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn token_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.token_lookup_timeout_ms)
    }

    pub fn category_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.category_fetch_timeout_ms)
    }
}

fn check_timeout(key: &str, value_ms: u64) -> ConfigResult<()> {
    if !(1..=MAX_TIMEOUT_MS).contains(&value_ms) {
        return Err(ConfigError::Invalid(format!(
            "{key} must be between 1 and {MAX_TIMEOUT_MS}, got {value_ms}"
        )));
    }
    Ok(())
}

fn parse_millis(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(format!("`{key}` must be an integer, got `{value}`")))
}

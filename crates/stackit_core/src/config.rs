//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//!
//! # Invariants
//! - Lookup is injectable so tests never touch process environment.
//! - `log_dir`, when present, is absolute.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "STACKIT_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "STACKIT_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STACKIT_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "stackit.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(db_path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                key: LOG_LEVEL_ENV,
                message: err.to_string(),
            })?;
        }
        if let Some(log_dir) = read(LOG_DIR_ENV) {
            let path = PathBuf::from(&log_dir);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: LOG_DIR_ENV,
                    message: format!("must be an absolute path, got `{log_dir}`"),
                });
            }
            config.log_dir = Some(path);
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DB_PATH_ENV, DEFAULT_DB_PATH, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.log_dir, None);
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /data/forum.db "),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, "/var/log/stackit"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/forum.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/stackit")));
    }

    #[test]
    fn rejects_bad_level_and_relative_log_dir() {
        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_LEVEL_ENV, "chatty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: LOG_LEVEL_ENV, .. }));

        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: LOG_DIR_ENV, .. }));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = CoreConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, "   ")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }
}

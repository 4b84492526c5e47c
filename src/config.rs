//! Store configuration parsed from environment variables.

use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use crate::consts::{PLACEHOLDER_USER_ID, STORAGE_KEY};
use crate::error::ErrorCode;

pub const DEFAULT_STORAGE_DIR: &str = ".newtube";

pub const ENV_STORAGE_KEY: &str = "NEWTUBE_STORAGE_KEY";
pub const ENV_USER_ID: &str = "NEWTUBE_USER_ID";
pub const ENV_STORAGE_DIR: &str = "NEWTUBE_STORAGE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
    #[error("{var} contains a path separator: {value}")]
    InvalidKey { var: &'static str, value: String },
    #[error("{var} is not valid unicode")]
    NotUnicode { var: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_CONFIG"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the layout slice is persisted under.
    pub storage_key: String,
    /// Owner stamped on new layouts.
    pub user_id: String,
    /// Directory for file-backed storage.
    pub storage_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_owned(),
            user_id: PLACEHOLDER_USER_ID.to_owned(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl StoreConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `NEWTUBE_STORAGE_KEY`: default `newtube-layout-storage`
    /// - `NEWTUBE_USER_ID`: default `current-user`
    /// - `NEWTUBE_STORAGE_DIR`: default `.newtube`
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a variable is set but empty or not
    /// unicode, or the storage key would escape the storage directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for var in [ENV_STORAGE_KEY, ENV_USER_ID, ENV_STORAGE_DIR] {
            if let Some(value) = read_var(var, std::env::var(var))? {
                vars.insert(var, value);
            }
        }
        Self::from_lookup(|var| vars.get(var).cloned())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_key = non_empty(ENV_STORAGE_KEY, lookup(ENV_STORAGE_KEY))?.unwrap_or(defaults.storage_key);
        if storage_key.contains(['/', '\\']) {
            return Err(ConfigError::InvalidKey { var: ENV_STORAGE_KEY, value: storage_key });
        }
        let user_id = non_empty(ENV_USER_ID, lookup(ENV_USER_ID))?.unwrap_or(defaults.user_id);
        let storage_dir = non_empty(ENV_STORAGE_DIR, lookup(ENV_STORAGE_DIR))?
            .map_or(defaults.storage_dir, PathBuf::from);

        Ok(Self { storage_key, user_id, storage_dir })
    }
}

/// An unset variable is `None`; a set but non-unicode one is an error.
fn read_var(var: &'static str, value: Result<String, VarError>) -> Result<Option<String>, ConfigError> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { var }),
    }
}

fn non_empty(var: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::Empty { var }),
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

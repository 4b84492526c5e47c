//! Persistence adapter: key-value storage backends and the persisted envelope.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store mirrors `{layouts, currentLayout}` into a `Storage` after every
//! change and reads it back once at startup. `Storage` is the same narrow
//! synchronous get/set contract as browser `localStorage`, so a web host can
//! implement it over `web_sys::Storage` while native hosts use `FileStorage`.
//!
//! ERROR HANDLING
//! ==============
//! Backends report I/O and quota failures as `StorageError`; a record that
//! fails to parse surfaces as `StorageError::Corrupt` so the caller decides
//! whether to reset. A record written under another schema version is not an
//! error: it is dropped with a warning and treated as absent.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::STORAGE_SCHEMA_VERSION;
use crate::error::ErrorCode;
use crate::layout::Layout;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("storage quota exceeded writing `{key}`: {needed} bytes, limit {limit}")]
    QuotaExceeded { key: String, needed: usize, limit: usize },
    #[error("stored record `{key}` is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode layout state: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_STORAGE_IO",
            Self::QuotaExceeded { .. } => "E_STORAGE_QUOTA",
            Self::Corrupt { .. } => "E_STORAGE_CORRUPT",
            Self::Encode(_) => "E_STORAGE_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Synchronous string key-value storage.
pub trait Storage {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend can't be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the write fails or exceeds a quota.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend can't be written.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage with an optional total byte quota.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the summed length of all keys and values at `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self { items: HashMap::new(), quota: Some(bytes) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_excluding(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { key: key.to_owned(), needed, limit });
            }
        }
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the backing directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_owned(), source }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source: io::Error| StorageError::Io { key: key.to_owned(), source };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_owned(), source }),
        }
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// The persisted projection of store state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub layouts: Vec<Layout>,
    pub current_layout: Option<Layout>,
}

/// Top-level record: `{ "state": {...}, "version": N }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    pub state: PersistedState,
    pub version: u32,
}

/// Serialize and write the `{layouts, currentLayout}` slice under `key`.
///
/// # Errors
///
/// Returns `Encode` if serialization fails, or the backend's write error.
pub fn save_state<S: Storage + ?Sized>(
    storage: &mut S,
    key: &str,
    layouts: &[Layout],
    current_layout: Option<&Layout>,
) -> Result<(), StorageError> {
    let envelope = EnvelopeRef { state: StateRef { layouts, current_layout }, version: STORAGE_SCHEMA_VERSION };
    let raw = serde_json::to_string(&envelope).map_err(StorageError::Encode)?;
    storage.set_item(key, &raw)
}

/// Read the state stored under `key`.
///
/// Returns `Ok(None)` when nothing is stored or the record was written under
/// a different schema version.
///
/// # Errors
///
/// Returns `Corrupt` if the record isn't a valid envelope, or the backend's
/// read error.
pub fn load_state<S: Storage + ?Sized>(storage: &S, key: &str) -> Result<Option<PersistedState>, StorageError> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    let envelope: PersistedEnvelope =
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { key: key.to_owned(), source })?;
    if envelope.version != STORAGE_SCHEMA_VERSION {
        warn!(
            key,
            stored = envelope.version,
            expected = STORAGE_SCHEMA_VERSION,
            "discarding layout state with unsupported schema version"
        );
        return Ok(None);
    }
    Ok(Some(envelope.state))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateRef<'a> {
    layouts: &'a [Layout],
    current_layout: Option<&'a Layout>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: StateRef<'a>,
    version: u32,
}

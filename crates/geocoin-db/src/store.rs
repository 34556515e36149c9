//! Synchronous key-value stores.
//!
//! The game keeps its whole state under one key, so the store interface is
//! deliberately small: string values addressed by string keys.
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`MemoryStore`] | `BTreeMap` | tests, embedding |
//! | [`FileStore`] | one `<key>.json` file per key in a directory | the engine binary |

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::DbError;

/// File extension used for entries written by [`FileStore`].
const ENTRY_EXTENSION: &str = "json";

/// Extension of the hidden file a write is staged in.
const STAGING_EXTENSION: &str = "tmp";

/// A durable string-to-string map.
pub trait KeyValueStore {
    /// Read the value at `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, DbError>;

    /// Store `value` at `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), DbError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), DbError>;

    /// Delete every key.
    fn clear(&mut self) -> Result<(), DbError>;
}

// =========================================================================
// MemoryStore
// =========================================================================

/// In-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Create a store whose `key` already holds `value`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.into(), value.into());
        Self { entries }
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no keys are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DbError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DbError> {
        self.entries.clear();
        Ok(())
    }
}

// =========================================================================
// FileStore
// =========================================================================

/// Directory-backed store: each key lives in `<dir>/<key>.json`.
///
/// Writes go to a hidden temporary file that is then renamed over the
/// entry, so readers never observe a partially written value. A failed
/// write removes its staging file; [`KeyValueStore::clear`] also sweeps any
/// that an interrupted process left behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DbError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| DbError::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    /// The directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for `key`.
    ///
    /// Keys are restricted to ASCII letters, digits, `-` and `_` so they
    /// always name a file directly inside the store directory.
    fn entry_path(&self, key: &str) -> Result<PathBuf, DbError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DbError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DbError::io(path, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        let path = self.entry_path(key)?;
        let staging = self.dir.join(format!(".{key}.{ENTRY_EXTENSION}.{STAGING_EXTENSION}"));
        if let Err(e) = fs::write(&staging, value) {
            discard_staging(&staging);
            return Err(DbError::io(&staging, e));
        }
        if let Err(e) = fs::rename(&staging, &path) {
            discard_staging(&staging);
            return Err(DbError::io(&path, e));
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DbError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DbError::io(path, e)),
        }
    }

    fn clear(&mut self) -> Result<(), DbError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| DbError::io(&self.dir, e))?;
        let mut removed: usize = 0;
        for entry in entries {
            let path = entry.map_err(|e| DbError::io(&self.dir, e))?.path();
            let is_entry = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == STAGING_EXTENSION);
            if is_entry {
                fs::remove_file(&path).map_err(|e| DbError::io(&path, e))?;
                removed = removed.saturating_add(1);
            }
        }
        tracing::debug!(dir = %self.dir.display(), removed, "Cleared file store");
        Ok(())
    }
}

/// Best-effort removal of a staging file left by a failed write.
fn discard_staging(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %staging.display(), error = %e, "Could not remove staging file");
        }
    }
}

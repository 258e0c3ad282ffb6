//! Durable client-side key-value storage.
//!
//! The cart, the applied coupon and the anonymous session id survive restarts
//! through a small string key-value store. Values are JSON documents; a value
//! that fails to parse is treated by callers as absent.
//!
//! # Backends
//!
//! - [`MemoryStore`] - In-process map, used by tests and embedders
//! - [`FileStore`] - Single JSON file in the state directory, written atomically

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Storage keys used by the storefront.
pub mod keys {
    /// Anonymous session identifier, minted once per install.
    pub const SESSION_ID: &str = "sessionId";

    /// Serialized cart item array.
    pub const CART: &str = "cart";

    /// Serialized applied coupon (absent when none is applied).
    pub const COUPON: &str = "coupon";

    /// Logged-in customer profile used to pre-fill the shipping form.
    pub const USER: &str = "user";

    /// Idempotency key kept for the lifetime of a reservation window.
    pub const CHECKOUT_KEY: &str = "checkoutKey";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entries could not be encoded for writing.
    #[error("storage file {path} could not be encoded: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A string key-value store with durable semantics.
pub trait KeyValueStore {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. to simulate data left by a previous run.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Peek at a raw value.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of `set`/`remove` calls observed.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes += 1;
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.writes += 1;
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Store persisted as one JSON object in a file.
///
/// The whole map is rewritten on every change through a temporary file and a
/// rename, so a crash never leaves a half-written document behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// File name used inside the state directory.
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// A file that does not parse is moved aside to `storage.json.corrupt` and
    /// the store starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the existing file
    /// cannot be read or moved aside.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(Self::FILE_NAME);
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Storage file is corrupt, starting empty"
                    );
                    fs::rename(&path, &aside).map_err(|source| StorageError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file store");
        Ok(Self { path, entries })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let body = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StorageError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

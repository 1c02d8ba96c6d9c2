//! Property store abstraction and backends.
//!
//! # Design
//! - `PropertyStore` is the boundary to the host's durable configuration: a
//!   flat key/value namespace with typed reads, typed writes, and an explicit
//!   flush. Writes only touch the store's in-memory view; durability happens
//!   on `save`.
//! - Stores are externally owned and may be shared between components, so the
//!   attachment handle is an `Arc<Mutex<_>>` ([`SharedStore`]) rather than an
//!   owned value.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors surfaced by property store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested property is not present in the store.
    #[error("property '{key}' is not set")]
    Missing {
        /// Key that was requested.
        key: String,
    },
    /// The stored value could not be coerced to the requested type.
    #[error("property '{key}' holds '{value}', which is not a boolean")]
    Coercion {
        /// Key that was requested.
        key: String,
        /// Raw stored value that failed to parse.
        value: String,
    },
    /// The backing file did not contain a valid property document.
    #[error("property document is malformed: {detail}")]
    Malformed {
        /// Parse error detail.
        detail: serde_json::Error,
    },
    /// Reading or flushing the backing file failed.
    #[error("property store I/O failed")]
    Io {
        /// Source I/O error.
        source: io::Error,
    },
}

/// Durable key/value configuration backend consumed by the API options.
///
/// Implementations store values as strings under a flat namespace with
/// dot-separated segments (`api.enabled`, `api.key`, ...).
pub trait PropertyStore: Send + std::fmt::Debug {
    /// Read a property as a boolean.
    ///
    /// Callers deciding runtime flags are expected to catch both failure
    /// modes and fall back to their own defaults.
    ///
    /// # Errors
    /// [`StoreError::Missing`] when the key is unset;
    /// [`StoreError::Coercion`] when the stored value does not parse as a
    /// boolean.
    fn get_bool(&self, key: &str) -> Result<bool, StoreError>;

    /// Read a property as a string, or `None` when unset.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Write a boolean property into the store's in-memory view.
    fn set_bool(&mut self, key: &str, value: bool);

    /// Write a string property into the store's in-memory view.
    fn set_string(&mut self, key: &str, value: &str);

    /// Flush the in-memory view to durable storage.
    ///
    /// # Errors
    /// [`StoreError::Io`] (or another backend-specific variant) when the
    /// flush fails.
    fn save(&mut self) -> Result<(), StoreError>;

    /// Wrap the store into a [`SharedStore`] handle.
    #[must_use]
    fn into_shared(self) -> SharedStore
    where
        Self: Sized + 'static,
    {
        Arc::new(Mutex::new(self))
    }
}

/// Shared handle to an externally owned property store.
pub type SharedStore = Arc<Mutex<dyn PropertyStore>>;

/// Lenient boolean parsing used for persisted flag values.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_from_map(values: &BTreeMap<String, String>, key: &str) -> Result<bool, StoreError> {
    let raw = values.get(key).ok_or_else(|| StoreError::Missing {
        key: key.to_owned(),
    })?;
    parse_bool(raw).ok_or_else(|| StoreError::Coercion {
        key: key.to_owned(),
        value: raw.clone(),
    })
}

/// In-memory property store.
///
/// Useful for tests and for hosts that do not persist API settings; `save` is
/// a no-op that always succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyStore for MemoryStore {
    fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
        bool_from_map(&self.values, key)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_owned(), value.to_string());
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }

    fn save(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Property store persisted as a flat JSON object on disk.
///
/// The document maps dot-separated keys to string values. A missing file is
/// treated as an empty store; an unparsable file is an error at open time so
/// the host can decide whether to discard it.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store backed by `path`, reading the current contents if the
    /// file exists.
    ///
    /// # Errors
    /// [`StoreError::Io`] when the file exists but cannot be read and
    /// [`StoreError::Malformed`] when it does not hold a valid document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|detail| StoreError::Malformed { detail })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { source }),
        };
        Ok(Self { path, values })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertyStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
        bool_from_map(&self.values, key)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_owned(), value.to_string());
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let document = serde_json::to_string_pretty(&self.values)
            .map_err(|detail| StoreError::Malformed { detail })?;
        fs::write(&self.path, document).map_err(|source| StoreError::Io { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_lenient_forms() {
        for raw in ["true", "TRUE", " yes ", "On"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "no", "OFF"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["", "Not Boolean", "1maybe", "truthy"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn memory_store_round_trips_typed_values() {
        let mut store = MemoryStore::new();
        store.set_bool("api.enabled", false);
        store.set_string("api.key", "abc");
        assert!(!store.get_bool("api.enabled").expect("bool"));
        assert_eq!(store.get_string("api.key").as_deref(), Some("abc"));
        store.save().expect("memory save never fails");
    }

    #[test]
    fn memory_store_reports_missing_and_coercion_failures() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.get_bool("api.enabled"),
            Err(StoreError::Missing { .. })
        ));
        store.set_string("api.enabled", "Not Boolean");
        assert!(matches!(
            store.get_bool("api.enabled"),
            Err(StoreError::Coercion { .. })
        ));
    }

    #[test]
    fn json_file_store_persists_and_reopens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("api.json");

        let mut store = JsonFileStore::open(&path).expect("missing file is an empty store");
        assert_eq!(store.get_string("api.key"), None);
        store.set_bool("api.secure", true);
        store.set_string("api.key", "persisted");
        store.save().expect("save");

        let reopened = JsonFileStore::open(&path).expect("reopen");
        assert!(reopened.get_bool("api.secure").expect("bool"));
        assert_eq!(reopened.get_string("api.key").as_deref(), Some("persisted"));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn json_file_store_rejects_malformed_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("api.json");
        fs::write(&path, "not json at all").expect("write");

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[test]
    fn json_file_store_save_surfaces_io_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store =
            JsonFileStore::open(dir.path().join("missing").join("api.json")).expect("open");
        store.set_bool("api.enabled", true);
        assert!(matches!(store.save(), Err(StoreError::Io { .. })));
    }
}

//! Persisted key-value store.
//!
//! One JSON file per key under the data directory. Reads go through an
//! in-memory cache; writes replace the file atomically and refresh the cache.
//! A value that cannot be read back is treated as absent so a damaged file
//! never keeps the server from starting.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct PersistedStore {
    dir: PathBuf,
    cache: DashMap<String, Value>,
}

impl PersistedStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: DashMap::new(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Raw JSON stored under `key`.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.cache.get(key) {
            return Some(value.clone());
        }

        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read stored value");
                return None;
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                self.cache.insert(key.to_string(), value.clone());
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Stored value is not valid JSON, ignoring it");
                None
            }
        }
    }

    /// Typed value stored under `key`; `None` when missing or of the wrong
    /// shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Stored value has an unexpected shape, ignoring it");
                None
            }
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Replace the value under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let bytes = serde_json::to_vec_pretty(&value)?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;

        self.cache.insert(key.to_string(), value);
        tracing::trace!(key = %key, "Stored value");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.cache.remove(key);
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistedStore::open(dir.path()).unwrap();
        assert!(store.get_raw("nothing").is_none());
        let list: Vec<String> = store.get_or_default("nothing");
        assert!(list.is_empty());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = PersistedStore::open(dir.path()).unwrap();
            store.set("autoservice-theme", "dark").unwrap();
            store.set("numbers", &vec![1, 2, 3]).unwrap();
        }

        let store = PersistedStore::open(dir.path()).unwrap();
        assert_eq!(store.get::<String>("autoservice-theme").as_deref(), Some("dark"));
        assert_eq!(store.get::<Vec<i32>>("numbers"), Some(vec![1, 2, 3]));
        assert!(!dir.path().join(".numbers.json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        fs::write(dir.path().join("shape.json"), b"{\"a\": 1}").unwrap();

        let store = PersistedStore::open(dir.path()).unwrap();
        assert!(store.get_raw("broken").is_none());
        let list: Vec<i32> = store.get_or_default("shape");
        assert!(list.is_empty());
        assert_eq!(store.get_raw("shape"), Some(json!({"a": 1})));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistedStore::open(dir.path()).unwrap();
        store.set("k", &json!(true)).unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get_raw("k").is_none());
    }
}

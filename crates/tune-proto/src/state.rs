//! File-backed key-value store for the little state that survives restarts.
//!
//! The whole map is read once at startup and written back in full on every
//! `set`.  Callers own all synchronisation; the store itself never locks.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

pub const FAVORITES_KEY: &str = "favorites";
pub const VOLUME_KEY: &str = "tunetracker-volume";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One store file shared by every component that persists through it.
pub type SharedStore = Arc<Mutex<KvStore>>;

/// Lock a shared store; a poisoned lock still hands out the map.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, KvStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct KvStore {
    /// None keeps everything in memory (tests, read-only sessions).
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
}

impl KvStore {
    /// Open the store at `path`.  A missing or unreadable file yields an
    /// empty store; the file is only created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_entries(&path);
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Typed read; a value of the wrong shape reads as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("store: ignoring malformed value for '{}': {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn load_entries(path: &Path) -> BTreeMap<String, Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("store: {} is not a JSON object ({}), starting empty", path.display(), e);
                BTreeMap::new()
            }
        }
    }
}

//! In-memory backing store.
//!
//! Used by the tests and by callers that want an ephemeral store. Nothing is
//! persisted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{PrefsError, PrefsResult};

use super::{BackingStore, ObserverList, StoreObserver};

/// Thread-safe [`BackingStore`] over a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryBackingStore {
    entries: RwLock<HashMap<String, String>>,
    observers: ObserverList,
}

impl MemoryBackingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of raw entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the raw entries.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.read().map(|entries| entries.clone()).unwrap_or_default()
    }

    fn read(&self) -> PrefsResult<RwLockReadGuard<'_, HashMap<String, String>>> {
        self.entries
            .read()
            .map_err(|e| PrefsError::backing(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> PrefsResult<RwLockWriteGuard<'_, HashMap<String, String>>> {
        self.entries
            .write()
            .map_err(|e| PrefsError::backing(format!("lock poisoned: {e}")))
    }
}

impl BackingStore for MemoryBackingStore {
    fn get_string(&self, key: &str) -> PrefsResult<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.write()?.insert(key.to_string(), value.to_string());
        self.observers.notify(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn remove(&self, key: &str) -> PrefsResult<()> {
        let removed = self.write()?.remove(key).is_some();
        if removed {
            self.observers.notify(key);
        }
        Ok(())
    }

    fn clear(&self) -> PrefsResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn keys(&self) -> PrefsResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn register_observer(&self, observer: &Arc<dyn StoreObserver>) {
        self.observers.add(observer);
    }
}

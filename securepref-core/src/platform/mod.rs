//! Platform interfaces for the plaintext backing store.
//!
//! The backing store only ever sees string keys and string values. Whatever
//! it holds has already been encrypted by [`crate::store::EncryptedStore`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::error::PrefsResult;

pub mod file;
pub mod memory;

pub use file::FileBackingStore;
pub use memory::MemoryBackingStore;

/// Receives raw change notifications from a [`BackingStore`].
pub trait StoreObserver: Send + Sync {
    /// Called after the entry stored under `raw_key` was written or removed.
    fn on_changed(&self, raw_key: &str);
}

/// Plaintext string key-value store provided by the host platform.
pub trait BackingStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_string(&self, key: &str) -> PrefsResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put_string(&self, key: &str, value: &str) -> PrefsResult<()>;

    /// Returns `true` if an entry exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn contains(&self, key: &str) -> PrefsResult<bool>;

    /// Removes the entry under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&self, key: &str) -> PrefsResult<()>;

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn clear(&self) -> PrefsResult<()>;

    /// Lists the raw keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn keys(&self) -> PrefsResult<Vec<String>>;

    /// Registers an observer. Stores hold observers weakly, so the caller
    /// keeps the registration alive by keeping the `Arc`.
    fn register_observer(&self, observer: &Arc<dyn StoreObserver>);
}

/// Weakly held observers shared by the in-crate stores.
#[derive(Default)]
pub(crate) struct ObserverList {
    observers: Mutex<Vec<Weak<dyn StoreObserver>>>,
}

impl ObserverList {
    pub(crate) fn add(&self, observer: &Arc<dyn StoreObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(observer));
    }

    /// Notifies live observers and prunes dead ones. Must be called without
    /// holding the store's data lock.
    pub(crate) fn notify(&self, raw_key: &str) {
        let live: Vec<Arc<dyn StoreObserver>> = {
            let mut observers = self
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            observers.retain(|observer| observer.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.on_changed(raw_key);
        }
    }
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .observers
            .lock()
            .map_or(0, |observers| observers.len());
        f.debug_struct("ObserverList")
            .field("observers", &count)
            .finish()
    }
}

//! Encrypted string store over a plaintext [`BackingStore`].
//!
//! Values are always encrypted. Key names are encrypted as well when
//! `encrypt_keys` is set; the key cipher is deterministic, so the stored key
//! for a given plaintext key can be recomputed and no index is kept.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::cipher::CipherCodec;
use crate::error::PrefsResult;
use crate::platform::{BackingStore, StoreObserver};

/// Callback invoked with the plaintext key after its entry changed.
pub trait ChangeListener: Send + Sync {
    /// Called after `key` was written or removed.
    fn on_change(&self, key: &str);
}

impl<F> ChangeListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_change(&self, key: &str) {
        self(key);
    }
}

/// Listeners keyed by stored (possibly encrypted) key.
struct ListenerRegistry {
    codec: CipherCodec,
    encrypt_keys: bool,
    listeners: RwLock<HashMap<String, Arc<dyn ChangeListener>>>,
}

impl StoreObserver for ListenerRegistry {
    fn on_changed(&self, raw_key: &str) {
        let listener = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(raw_key)
            .cloned();
        let Some(listener) = listener else {
            tracing::trace!("no listener for changed entry");
            return;
        };

        let key = if self.encrypt_keys {
            match self.codec.decrypt_key(raw_key) {
                Ok(key) => key,
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring change of an entry with a foreign key");
                    return;
                }
            }
        } else {
            raw_key.to_string()
        };
        tracing::debug!(key = %key, "dispatching preference change");
        listener.on_change(&key);
    }
}

/// Encrypts values and key names on the way into a [`BackingStore`] and
/// decrypts them on the way out.
pub struct EncryptedStore {
    backing: Arc<dyn BackingStore>,
    codec: CipherCodec,
    encrypt_keys: bool,
    registry: Arc<ListenerRegistry>,
}

impl EncryptedStore {
    /// Wraps `backing`. The store registers itself as an observer of
    /// `backing` to forward change notifications to its listeners.
    #[must_use]
    pub fn new(backing: Arc<dyn BackingStore>, codec: CipherCodec, encrypt_keys: bool) -> Self {
        let registry = Arc::new(ListenerRegistry {
            codec: codec.clone(),
            encrypt_keys,
            listeners: RwLock::new(HashMap::new()),
        });
        let observer: Arc<dyn StoreObserver> = registry.clone();
        backing.register_observer(&observer);
        Self {
            backing,
            codec,
            encrypt_keys,
            registry,
        }
    }

    /// Whether key names are encrypted.
    #[must_use]
    pub const fn encrypt_keys(&self) -> bool {
        self.encrypt_keys
    }

    /// The cipher used for values and key names.
    #[must_use]
    pub const fn codec(&self) -> &CipherCodec {
        &self.codec
    }

    /// The underlying plaintext store.
    #[must_use]
    pub fn backing(&self) -> &Arc<dyn BackingStore> {
        &self.backing
    }

    /// Stored key for `key`: encrypted when key encryption is on, unchanged otherwise.
    #[must_use]
    pub fn to_key(&self, key: &str) -> String {
        if self.encrypt_keys {
            self.codec.encrypt_key(key)
        } else {
            key.to_string()
        }
    }

    /// Writes `value` under `key`. `None` removes the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn put(&self, key: &str, value: Option<&str>) -> PrefsResult<()> {
        let Some(value) = value else {
            return self.remove(key);
        };
        self.backing
            .put_string(&self.to_key(key), &self.codec.encrypt_str(value))
    }

    /// Reads and decrypts the value under `key`.
    ///
    /// An entry that cannot be decrypted (written under another key, or
    /// corrupted) is deleted and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails. Cipher failures are never
    /// returned.
    pub fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let raw_key = self.to_key(key);
        let Some(encrypted) = self.backing.get_string(&raw_key)? else {
            return Ok(None);
        };
        match self.codec.decrypt_str(&encrypted) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key, error = %err, "removing preference that cannot be decrypted");
                self.backing.remove(&raw_key)?;
                Ok(None)
            }
        }
    }

    /// Returns `true` if an entry exists for `key`. Does not decrypt it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn contains_key(&self, key: &str) -> PrefsResult<bool> {
        self.backing.contains(&self.to_key(key))
    }

    /// Removes the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn remove(&self, key: &str) -> PrefsResult<()> {
        self.backing.remove(&self.to_key(key))
    }

    /// Removes every entry of the backing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn clear(&self) -> PrefsResult<()> {
        self.backing.clear()
    }

    /// Plaintext keys currently stored. Entries whose key cannot be decrypted
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn keys(&self) -> PrefsResult<Vec<String>> {
        let raw_keys = self.backing.keys()?;
        if !self.encrypt_keys {
            return Ok(raw_keys);
        }
        Ok(raw_keys
            .iter()
            .filter_map(|raw| match self.codec.decrypt_key(raw) {
                Ok(key) => Some(key),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping entry with a foreign key");
                    None
                }
            })
            .collect())
    }

    /// Registers `listener` for changes of `key`, replacing any previous one.
    pub fn register_listener(&self, key: &str, listener: Arc<dyn ChangeListener>) {
        self.registry
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.to_key(key), listener);
    }

    /// Removes the listener for `key`, if any.
    pub fn unregister_listener(&self, key: &str) {
        self.registry
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.to_key(key));
    }
}

impl std::fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore")
            .field("encrypt_keys", &self.encrypt_keys)
            .finish_non_exhaustive()
    }
}

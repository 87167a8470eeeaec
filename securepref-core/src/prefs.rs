//! Typed preference API.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use crate::binding::{Binding, MutableBinding};
use crate::cipher::CipherCodec;
use crate::config::PrefsConfig;
use crate::error::{PrefsError, PrefsResult};
use crate::identity::{generate_secure_key, DeviceIdentity};
use crate::keys::SecureKey;
use crate::marshal::{JsonCodec, Marshal, Marshaller, PrefValue, StructuredCodec, TypeDescriptor};
use crate::observable::{ObservableList, ObservableMap, ObservableSet};
use crate::platform::BackingStore;
use crate::store::{ChangeListener, EncryptedStore};

struct PrefsInner {
    name: String,
    store: EncryptedStore,
    marshaller: Marshaller,
}

/// Encrypted, typed preferences over a [`BackingStore`].
///
/// Cloning is cheap; clones share the same store.
///
/// ```
/// use std::sync::Arc;
///
/// use securepref_core::{MemoryBackingStore, Preferences, PrefsConfig, SecureKey};
///
/// let prefs = Preferences::open(
///     Arc::new(MemoryBackingStore::new()),
///     &SecureKey::new("device-secret").unwrap(),
///     &PrefsConfig::default(),
/// );
/// prefs.set("volume", &7).unwrap();
/// assert_eq!(prefs.get_or("volume", 0).unwrap(), 7);
/// ```
#[derive(Clone)]
pub struct Preferences {
    inner: Arc<PrefsInner>,
}

impl Preferences {
    /// Opens preferences encrypted under `secure_key`, using JSON for
    /// structured values.
    #[must_use]
    pub fn open(
        backing: Arc<dyn BackingStore>,
        secure_key: &SecureKey,
        config: &PrefsConfig,
    ) -> Self {
        Self::open_with_codec(backing, secure_key, config, Arc::new(JsonCodec))
    }

    /// Opens preferences with a custom structured codec.
    #[must_use]
    pub fn open_with_codec(
        backing: Arc<dyn BackingStore>,
        secure_key: &SecureKey,
        config: &PrefsConfig,
        codec: Arc<dyn StructuredCodec>,
    ) -> Self {
        tracing::debug!(
            name = %config.name,
            encrypt_keys = config.encrypt_keys,
            "opening encrypted preferences"
        );
        let store = EncryptedStore::new(backing, CipherCodec::new(secure_key), config.encrypt_keys);
        Self {
            inner: Arc::new(PrefsInner {
                name: config.name.clone(),
                store,
                marshaller: Marshaller::new(codec),
            }),
        }
    }

    /// Opens preferences keyed by this device's identity.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::KeyDerivation`] if no secure key can be built.
    pub fn for_device(
        backing: Arc<dyn BackingStore>,
        identity: &dyn DeviceIdentity,
        config: &PrefsConfig,
    ) -> PrefsResult<Self> {
        let secure_key = generate_secure_key(identity)?;
        Ok(Self::open(backing, &secure_key, config))
    }

    /// Configured store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The encrypted string store underneath.
    #[must_use]
    pub fn store(&self) -> &EncryptedStore {
        &self.inner.store
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::UnsupportedType`] before touching the store if
    /// `T` has no stored form, [`PrefsError::Codec`] if the value cannot be
    /// serialized, or a backing store error.
    pub fn set<T: Marshal>(&self, key: &str, value: &T) -> PrefsResult<()> {
        T::descriptor().ensure_supported(key)?;
        let value = value
            .to_value()
            .map_err(|e| PrefsError::codec(key, e.to_string()))?;
        self.set_value(key, &value)
    }

    /// Stores a string as is.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn set_str(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.inner.store.put(key, Some(value))
    }

    /// Stores `value`, or removes `key` when `value` is `None`.
    ///
    /// # Errors
    ///
    /// See [`Self::set`].
    pub fn set_optional<T: Marshal>(&self, key: &str, value: Option<&T>) -> PrefsResult<()> {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    /// Stores a dynamically typed value.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Codec`] if a structured value cannot be
    /// serialized, or a backing store error.
    pub fn set_value(&self, key: &str, value: &PrefValue) -> PrefsResult<()> {
        let encoded = self.inner.marshaller.encode(value, key)?;
        self.inner.store.put(key, Some(&encoded))
    }

    /// Reads `key` as `T`. Missing keys, undecryptable entries and empty
    /// scalar values read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::UnsupportedType`], [`PrefsError::Format`] or
    /// [`PrefsError::Codec`] when the stored value does not decode as `T`, or
    /// a backing store error.
    pub fn get<T: Marshal>(&self, key: &str) -> PrefsResult<Option<T>> {
        let Some(value) = self.get_value(key, &T::descriptor())? else {
            return Ok(None);
        };
        T::from_value(value)
            .map(Some)
            .map_err(|e| PrefsError::codec(key, e.to_string()))
    }

    /// Reads `key` as `T`, falling back to `default`.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn get_or<T: Marshal>(&self, key: &str, default: T) -> PrefsResult<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Reads `key` as `T`, failing when there is no value.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::MissingKey`] when [`Self::get`] would return
    /// `None`, otherwise see [`Self::get`].
    pub fn require<T: Marshal>(&self, key: &str) -> PrefsResult<T> {
        self.get(key)?.ok_or_else(|| PrefsError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Reads `key` as the type described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::UnsupportedType`] before touching the store if
    /// `descriptor` is unsupported, otherwise see [`Self::get`].
    pub fn get_value(
        &self,
        key: &str,
        descriptor: &TypeDescriptor,
    ) -> PrefsResult<Option<PrefValue>> {
        descriptor.ensure_supported(key)?;
        let Some(raw) = self.inner.store.get(key)? else {
            return Ok(None);
        };
        self.inner.marshaller.decode(&raw, descriptor, key)
    }

    /// Reads `key` as a list that writes itself back on every mutation.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn get_mutable_list<T>(&self, key: &str) -> PrefsResult<Option<ObservableList<T>>>
    where
        T: Marshal + 'static,
    {
        self.get_mutable::<Vec<T>>(key)
    }

    /// Reads `key` as a map that writes itself back on every mutation.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn get_mutable_map<K, V>(&self, key: &str) -> PrefsResult<Option<ObservableMap<K, V>>>
    where
        HashMap<K, V>: Marshal,
        K: Eq + Hash + 'static,
        V: 'static,
    {
        self.get_mutable::<HashMap<K, V>>(key)
    }

    /// Reads `key` as a set that writes itself back on every mutation.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn get_mutable_set<T>(&self, key: &str) -> PrefsResult<Option<ObservableSet<T>>>
    where
        HashSet<T>: Marshal,
        T: Eq + Hash + 'static,
    {
        self.get_mutable::<HashSet<T>>(key)
    }

    /// Reads `key` as any [`Observe`] collection.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn get_mutable<C: Observe>(&self, key: &str) -> PrefsResult<Option<C::Container>> {
        Ok(self.get::<C>(key)?.map(|items| items.observe(self, key)))
    }

    /// Whether a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn contains(&self, key: &str) -> PrefsResult<bool> {
        self.inner.store.contains_key(key)
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn remove(&self, key: &str) -> PrefsResult<()> {
        self.inner.store.remove(key)
    }

    /// Removes every entry of the backing store.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn clear(&self) -> PrefsResult<()> {
        self.inner.store.clear()
    }

    /// Plaintext keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn keys(&self) -> PrefsResult<Vec<String>> {
        self.inner.store.keys()
    }

    /// Calls `listener` with `key` whenever its entry changes.
    pub fn register_listener(&self, key: &str, listener: Arc<dyn ChangeListener>) {
        self.inner.store.register_listener(key, listener);
    }

    /// Removes the listener for `key`.
    pub fn unregister_listener(&self, key: &str) {
        self.inner.store.unregister_listener(key);
    }

    /// Binds `key` to a typed value with a fallback.
    #[must_use]
    pub fn bind<T: Marshal + Clone>(&self, key: &str, default: T) -> Binding<T> {
        Binding::new(self.clone(), key, default)
    }

    /// Binds `key` to a list handed out as an [`ObservableList`].
    #[must_use]
    pub fn bind_list<T>(&self, key: &str, default: Vec<T>) -> MutableBinding<Vec<T>>
    where
        T: Marshal + Clone + 'static,
    {
        MutableBinding::new(self.clone(), key, default)
    }

    /// Binds `key` to a map handed out as an [`ObservableMap`].
    #[must_use]
    pub fn bind_map<K, V>(&self, key: &str, default: HashMap<K, V>) -> MutableBinding<HashMap<K, V>>
    where
        HashMap<K, V>: Marshal + Clone,
        K: Eq + Hash + 'static,
        V: 'static,
    {
        MutableBinding::new(self.clone(), key, default)
    }

    /// Binds `key` to a set handed out as an [`ObservableSet`].
    #[must_use]
    pub fn bind_set<T>(&self, key: &str, default: HashSet<T>) -> MutableBinding<HashSet<T>>
    where
        HashSet<T>: Marshal + Clone,
        T: Eq + Hash + 'static,
    {
        MutableBinding::new(self.clone(), key, default)
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("name", &self.inner.name)
            .field("store", &self.inner.store)
            .finish()
    }
}

/// A stored collection that can be handed out as a write-back container.
pub trait Observe: Marshal {
    /// The observable wrapper.
    type Container;

    /// Wraps `self` so that every mutation is stored under `key`.
    fn observe(self, prefs: &Preferences, key: &str) -> Self::Container;
}

impl<T: Marshal + 'static> Observe for Vec<T> {
    type Container = ObservableList<T>;

    fn observe(self, prefs: &Preferences, key: &str) -> Self::Container {
        let prefs = prefs.clone();
        let key = key.to_string();
        ObservableList::new(self, move |items: &Self| prefs.set(&key, items))
    }
}

impl<K, V> Observe for HashMap<K, V>
where
    Self: Marshal,
    K: Eq + Hash + 'static,
    V: 'static,
{
    type Container = ObservableMap<K, V>;

    fn observe(self, prefs: &Preferences, key: &str) -> Self::Container {
        let prefs = prefs.clone();
        let key = key.to_string();
        ObservableMap::new(self, move |entries: &Self| prefs.set(&key, entries))
    }
}

impl<T> Observe for HashSet<T>
where
    Self: Marshal,
    T: Eq + Hash + 'static,
{
    type Container = ObservableSet<T>;

    fn observe(self, prefs: &Preferences, key: &str) -> Self::Container {
        let prefs = prefs.clone();
        let key = key.to_string();
        ObservableSet::new(self, move |items: &Self| prefs.set(&key, items))
    }
}

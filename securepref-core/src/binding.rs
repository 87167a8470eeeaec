//! Accessor objects binding one key and a default to a typed value.
//!
//! ```
//! use std::sync::Arc;
//!
//! use securepref_core::{MemoryBackingStore, Preferences, PrefsConfig, SecureKey};
//!
//! let prefs = Preferences::open(
//!     Arc::new(MemoryBackingStore::new()),
//!     &SecureKey::new("device-secret").unwrap(),
//!     &PrefsConfig::default(),
//! );
//! let recent = prefs.bind_list("recent", Vec::<String>::new());
//! recent.get().unwrap().push("notes.txt".into()).unwrap();
//! assert_eq!(*recent.get().unwrap(), vec!["notes.txt".to_string()]);
//! ```

use crate::error::PrefsResult;
use crate::marshal::Marshal;
use crate::prefs::{Observe, Preferences};

/// Typed value under a fixed key, read with a default.
#[derive(Debug, Clone)]
pub struct Binding<T> {
    prefs: Preferences,
    key: String,
    default: T,
}

impl<T: Marshal + Clone> Binding<T> {
    pub(crate) fn new(prefs: Preferences, key: &str, default: T) -> Self {
        Self {
            prefs,
            key: key.to_string(),
            default,
        }
    }

    /// The bound key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored value, or the default when absent.
    ///
    /// # Errors
    ///
    /// See [`Preferences::get`].
    pub fn get(&self) -> PrefsResult<T> {
        self.prefs.get_or(&self.key, self.default.clone())
    }

    /// Stores `value`.
    ///
    /// # Errors
    ///
    /// See [`Preferences::set`].
    pub fn set(&self, value: &T) -> PrefsResult<()> {
        self.prefs.set(&self.key, value)
    }

    /// Removes the stored value; later reads yield the default.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn remove(&self) -> PrefsResult<()> {
        self.prefs.remove(&self.key)
    }
}

/// Collection under a fixed key, handed out as a live observable container.
#[derive(Debug, Clone)]
pub struct MutableBinding<C> {
    prefs: Preferences,
    key: String,
    default: C,
}

impl<C: Observe + Clone> MutableBinding<C> {
    pub(crate) fn new(prefs: Preferences, key: &str, default: C) -> Self {
        Self {
            prefs,
            key: key.to_string(),
            default,
        }
    }

    /// The bound key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A container seeded with the stored value, or with the default when
    /// absent. Every mutation of it is stored under the key.
    ///
    /// # Errors
    ///
    /// See [`Preferences::get`].
    pub fn get(&self) -> PrefsResult<C::Container> {
        let items = self
            .prefs
            .get::<C>(&self.key)?
            .unwrap_or_else(|| self.default.clone());
        Ok(items.observe(&self.prefs, &self.key))
    }

    /// Replaces the stored collection.
    ///
    /// # Errors
    ///
    /// See [`Preferences::set`].
    pub fn set(&self, value: &C) -> PrefsResult<()> {
        self.prefs.set(&self.key, value)
    }

    /// Removes the stored collection.
    ///
    /// # Errors
    ///
    /// Returns a backing store error.
    pub fn remove(&self) -> PrefsResult<()> {
        self.prefs.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::config::PrefsConfig;
    use crate::keys::SecureKey;
    use crate::platform::MemoryBackingStore;

    use super::*;

    fn prefs() -> Preferences {
        Preferences::open(
            Arc::new(MemoryBackingStore::new()),
            &SecureKey::new("binding-tests").unwrap(),
            &PrefsConfig::default(),
        )
    }

    #[test]
    fn test_binding_default_set_remove() {
        let prefs = prefs();
        let volume = prefs.bind("volume", 5_i32);
        assert_eq!(volume.key(), "volume");
        assert_eq!(volume.get().unwrap(), 5);
        volume.set(&9).unwrap();
        assert_eq!(volume.get().unwrap(), 9);
        assert_eq!(prefs.get::<i32>("volume").unwrap(), Some(9));
        volume.remove().unwrap();
        assert_eq!(volume.get().unwrap(), 5);
    }

    #[test]
    fn test_mutable_binding_seeds_from_default_and_persists() {
        let prefs = prefs();
        let tags = prefs.bind_set("tags", HashSet::from(["new".to_string()]));
        assert!(!prefs.contains("tags").unwrap());

        let mut live = tags.get().unwrap();
        live.insert("urgent".into()).unwrap();

        let stored: HashSet<String> = prefs.get("tags").unwrap().unwrap();
        assert_eq!(stored, HashSet::from(["new".to_string(), "urgent".to_string()]));
        assert_eq!(tags.get().unwrap().len(), 2);

        tags.remove().unwrap();
        assert_eq!(tags.get().unwrap().len(), 1);
    }
}

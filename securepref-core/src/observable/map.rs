//! Observable `HashMap` with key, value and entry views.

#![allow(clippy::missing_errors_doc, clippy::iter_without_into_iter)]

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use crate::error::PrefsResult;

use super::ChangeCallback;

/// A `HashMap<K, V>` that calls back after every mutation.
pub struct ObservableMap<K, V> {
    entries: HashMap<K, V>,
    on_change: ChangeCallback<HashMap<K, V>>,
}

impl<K: Eq + Hash, V> ObservableMap<K, V> {
    /// Wraps `entries`. `on_change` runs after every mutation.
    pub fn new<F>(entries: HashMap<K, V>, on_change: F) -> Self
    where
        F: Fn(&HashMap<K, V>) -> PrefsResult<()> + Send + Sync + 'static,
    {
        Self {
            entries,
            on_change: Box::new(on_change),
        }
    }

    fn changed(&self) -> PrefsResult<()> {
        (self.on_change)(&self.entries)
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> PrefsResult<Option<V>> {
        let previous = self.entries.insert(key, value);
        self.changed().map(|()| previous)
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> PrefsResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.entries.remove(key);
        self.changed().map(|()| removed)
    }

    /// Inserts every pair of `entries`.
    pub fn extend<I>(&mut self, entries: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.entries.extend(entries);
        self.changed()
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, keep: F) -> PrefsResult<()>
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.entries.retain(keep);
        self.changed()
    }

    /// Applies `update` to the value under `key`, if present. Returns whether
    /// the key was present.
    pub fn update<Q, F>(&mut self, key: &Q, update: F) -> PrefsResult<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnOnce(&mut V),
    {
        let found = self.entries.get_mut(key).map(update).is_some();
        self.changed().map(|()| found)
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.entries.clear();
        self.changed()
    }

    /// View of the keys.
    pub fn keys_view(&mut self) -> KeysView<'_, K, V> {
        KeysView { map: self }
    }

    /// View of the values.
    pub fn values_view(&mut self) -> ValuesView<'_, K, V> {
        ValuesView { map: self }
    }

    /// View of the entries.
    pub fn entries_view(&mut self) -> EntriesView<'_, K, V> {
        EntriesView { map: self }
    }

    /// Drops the callback and returns the entries.
    pub fn into_inner(self) -> HashMap<K, V> {
        self.entries
    }
}

impl<K, V> Deref for ObservableMap<K, V> {
    type Target = HashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableMap").field(&self.entries).finish()
    }
}

/// Key view of an [`ObservableMap`]. Removing a key removes its entry.
pub struct KeysView<'a, K, V> {
    map: &'a mut ObservableMap<K, V>,
}

impl<K: Eq + Hash, V> KeysView<'_, K, V> {
    /// Iterates over the keys.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.map.entries.keys()
    }

    /// Whether `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.entries.contains_key(key)
    }

    /// Removes the entry for `key`. Returns whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> PrefsResult<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.remove(key).map(|removed| removed.is_some())
    }

    /// Keeps only the entries whose key satisfies `keep`.
    pub fn retain<F>(&mut self, mut keep: F) -> PrefsResult<()>
    where
        F: FnMut(&K) -> bool,
    {
        self.map.retain(|k, _| keep(k))
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.map.clear()
    }
}

/// Value view of an [`ObservableMap`]. Removing a value removes its entry.
pub struct ValuesView<'a, K, V> {
    map: &'a mut ObservableMap<K, V>,
}

impl<K: Eq + Hash, V> ValuesView<'_, K, V> {
    /// Iterates over the values.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.map.entries.values()
    }

    /// Removes one entry whose value equals `value`. Returns whether one was found.
    pub fn remove(&mut self, value: &V) -> PrefsResult<bool>
    where
        V: PartialEq,
    {
        let mut found = false;
        self.map.entries.retain(|_, v| {
            if !found && v == value {
                found = true;
                return false;
            }
            true
        });
        self.map.changed().map(|()| found)
    }

    /// Keeps only the entries whose value satisfies `keep`.
    pub fn retain<F>(&mut self, mut keep: F) -> PrefsResult<()>
    where
        F: FnMut(&V) -> bool,
    {
        self.map.retain(|_, v| keep(v))
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.map.clear()
    }
}

/// Entry view of an [`ObservableMap`].
pub struct EntriesView<'a, K, V> {
    map: &'a mut ObservableMap<K, V>,
}

impl<K: Eq + Hash, V> EntriesView<'_, K, V> {
    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.entries.iter()
    }

    /// Replaces the value of an existing entry, returning the old value.
    /// Absent keys are left absent.
    pub fn set_value<Q>(&mut self, key: &Q, value: V) -> PrefsResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let previous = self
            .map
            .entries
            .get_mut(key)
            .map(|slot| std::mem::replace(slot, value));
        self.map.changed().map(|()| previous)
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> PrefsResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.remove(key)
    }

    /// Keeps only the entries satisfying `keep`.
    pub fn retain<F>(&mut self, mut keep: F) -> PrefsResult<()>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.map.retain(|k, v| keep(k, v))
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.map.clear()
    }
}

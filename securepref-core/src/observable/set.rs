//! Observable `HashSet`.

#![allow(clippy::missing_errors_doc)]

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use crate::error::PrefsResult;

use super::ChangeCallback;

/// A `HashSet<T>` that calls back after every mutation.
pub struct ObservableSet<T> {
    items: HashSet<T>,
    on_change: ChangeCallback<HashSet<T>>,
}

impl<T: Eq + Hash> ObservableSet<T> {
    /// Wraps `items`. `on_change` runs after every mutation.
    pub fn new<F>(items: HashSet<T>, on_change: F) -> Self
    where
        F: Fn(&HashSet<T>) -> PrefsResult<()> + Send + Sync + 'static,
    {
        Self {
            items,
            on_change: Box::new(on_change),
        }
    }

    fn changed(&self) -> PrefsResult<()> {
        (self.on_change)(&self.items)
    }

    /// Adds `item`. Returns whether it was newly inserted.
    pub fn insert(&mut self, item: T) -> PrefsResult<bool> {
        let inserted = self.items.insert(item);
        self.changed().map(|()| inserted)
    }

    /// Removes `item`. Returns whether it was present.
    pub fn remove<Q>(&mut self, item: &Q) -> PrefsResult<bool>
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.items.remove(item);
        self.changed().map(|()| removed)
    }

    /// Adds every element of `items`.
    pub fn extend<I>(&mut self, items: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
        self.changed()
    }

    /// Keeps only the elements for which `keep` returns `true`.
    pub fn retain<F>(&mut self, keep: F) -> PrefsResult<()>
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(keep);
        self.changed()
    }

    /// Removes every element.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.items.clear();
        self.changed()
    }

    /// Drops the callback and returns the elements.
    pub fn into_inner(self) -> HashSet<T> {
        self.items
    }
}

impl<T> Deref for ObservableSet<T> {
    type Target = HashSet<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableSet").field(&self.items).finish()
    }
}

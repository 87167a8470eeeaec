//! Collections that report every mutation.
//!
//! Each container owns its collection and a change callback. A mutating
//! method first applies the change and then calls the callback with the whole
//! updated collection, even when the mutation changed nothing. The callback's
//! error is returned from the mutating method; the in-memory change is kept
//! either way.
//!
//! Reads go through `Deref` to the underlying collection. Derived views
//! (cursors, sub-lists, map key/value/entry views) borrow their parent and
//! report through the parent's callback.

use crate::error::PrefsResult;

pub mod list;
pub mod map;
pub mod set;

pub use list::{ListCursor, ObservableList, SubList};
pub use map::{EntriesView, KeysView, ObservableMap, ValuesView};
pub use set::ObservableSet;

/// Callback receiving the full collection after a mutation.
pub type ChangeCallback<C> = Box<dyn Fn(&C) -> PrefsResult<()> + Send + Sync>;

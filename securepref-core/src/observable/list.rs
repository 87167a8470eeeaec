//! Observable `Vec` with cursor and sub-list views.

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::ops::{Deref, Range};

use crate::error::{PrefsError, PrefsResult};

use super::ChangeCallback;

/// A `Vec<T>` that calls back after every mutation.
pub struct ObservableList<T> {
    items: Vec<T>,
    on_change: ChangeCallback<Vec<T>>,
}

impl<T> ObservableList<T> {
    /// Wraps `items`. `on_change` runs after every mutation.
    pub fn new<F>(items: Vec<T>, on_change: F) -> Self
    where
        F: Fn(&Vec<T>) -> PrefsResult<()> + Send + Sync + 'static,
    {
        Self {
            items,
            on_change: Box::new(on_change),
        }
    }

    fn changed(&self) -> PrefsResult<()> {
        (self.on_change)(&self.items)
    }

    fn check_index(&self, index: usize, len: usize) -> PrefsResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(PrefsError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Appends `item`.
    pub fn push(&mut self, item: T) -> PrefsResult<()> {
        self.items.push(item);
        self.changed()
    }

    /// Inserts `item` at `index`, shifting later elements. `index == len()` appends.
    pub fn insert(&mut self, index: usize, item: T) -> PrefsResult<()> {
        self.check_index(index, self.items.len() + 1)?;
        self.items.insert(index, item);
        self.changed()
    }

    /// Inserts all of `items` at `index`.
    pub fn insert_all<I>(&mut self, index: usize, items: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_index(index, self.items.len() + 1)?;
        self.items.splice(index..index, items);
        self.changed()
    }

    /// Appends all of `items`.
    pub fn extend<I>(&mut self, items: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
        self.changed()
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, item: T) -> PrefsResult<T> {
        self.check_index(index, self.items.len())?;
        let previous = std::mem::replace(&mut self.items[index], item);
        self.changed().map(|()| previous)
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> PrefsResult<T> {
        self.check_index(index, self.items.len())?;
        let removed = self.items.remove(index);
        self.changed().map(|()| removed)
    }

    /// Removes the first element equal to `item`. Returns whether one was found.
    pub fn remove_item(&mut self, item: &T) -> PrefsResult<bool>
    where
        T: PartialEq,
    {
        let position = self.items.iter().position(|x| x == item);
        if let Some(index) = position {
            self.items.remove(index);
        }
        self.changed().map(|()| position.is_some())
    }

    /// Removes the last element.
    pub fn pop(&mut self) -> PrefsResult<Option<T>> {
        let popped = self.items.pop();
        self.changed().map(|()| popped)
    }

    /// Keeps only the elements for which `keep` returns `true`.
    pub fn retain<F>(&mut self, keep: F) -> PrefsResult<()>
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(keep);
        self.changed()
    }

    /// Sorts the elements with `compare`.
    pub fn sort_by<F>(&mut self, compare: F) -> PrefsResult<()>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.items.sort_by(compare);
        self.changed()
    }

    /// Removes every element.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.items.clear();
        self.changed()
    }

    /// Cursor positioned before the first element.
    pub fn cursor(&mut self) -> ListCursor<'_, T> {
        ListCursor {
            list: self,
            next: 0,
            last: None,
        }
    }

    /// Cursor positioned before the element at `index`. `index == len()` is
    /// the end.
    pub fn cursor_at(&mut self, index: usize) -> PrefsResult<ListCursor<'_, T>> {
        self.check_index(index, self.items.len() + 1)?;
        Ok(ListCursor {
            list: self,
            next: index,
            last: None,
        })
    }

    /// Mutable view of `range`.
    pub fn sub_list(&mut self, range: Range<usize>) -> PrefsResult<SubList<'_, T>> {
        let len = self.items.len();
        if range.end > len {
            return Err(PrefsError::IndexOutOfBounds {
                index: range.end,
                len,
            });
        }
        if range.start > range.end {
            return Err(PrefsError::IllegalState(format!(
                "sub-list start {} is after end {}",
                range.start, range.end
            )));
        }
        Ok(SubList {
            list: self,
            start: range.start,
            end: range.end,
        })
    }

    /// Drops the callback and returns the elements.
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for ObservableList<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableList").field(&self.items).finish()
    }
}

/// Bidirectional cursor over an [`ObservableList`].
///
/// The cursor sits between elements. `remove` and `set` act on the element
/// returned by the last `next_item` or `previous_item`, and are illegal after
/// `add` or `remove` until the cursor moves again.
pub struct ListCursor<'a, T> {
    list: &'a mut ObservableList<T>,
    next: usize,
    last: Option<usize>,
}

impl<T> ListCursor<'_, T> {
    /// Whether `next_item` would return an element.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next < self.list.items.len()
    }

    /// Whether `previous_item` would return an element.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.next > 0
    }

    /// Index of the element `next_item` would return.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.next
    }

    /// Index of the element `previous_item` would return.
    #[must_use]
    pub const fn previous_index(&self) -> Option<usize> {
        self.next.checked_sub(1)
    }

    /// Advances past the next element and returns it.
    pub fn next_item(&mut self) -> Option<&T> {
        let index = self.next;
        let item = self.list.items.get(index)?;
        self.next += 1;
        self.last = Some(index);
        Some(item)
    }

    /// Steps back over the previous element and returns it.
    pub fn previous_item(&mut self) -> Option<&T> {
        let index = self.next.checked_sub(1)?;
        self.next = index;
        self.last = Some(index);
        self.list.items.get(index)
    }

    fn take_last(&mut self, operation: &str) -> PrefsResult<usize> {
        self.last.take().ok_or_else(|| {
            PrefsError::IllegalState(format!(
                "cursor {operation} without a preceding next or previous"
            ))
        })
    }

    /// Removes the element last returned.
    pub fn remove(&mut self) -> PrefsResult<T> {
        let index = self.take_last("remove")?;
        let removed = self.list.items.remove(index);
        if index < self.next {
            self.next -= 1;
        }
        self.list.changed().map(|()| removed)
    }

    /// Replaces the element last returned.
    pub fn set(&mut self, item: T) -> PrefsResult<()> {
        let index = self.last.ok_or_else(|| {
            PrefsError::IllegalState("cursor set without a preceding next or previous".into())
        })?;
        self.list.items[index] = item;
        self.list.changed()
    }

    /// Inserts `item` before the cursor position.
    pub fn add(&mut self, item: T) -> PrefsResult<()> {
        self.list.items.insert(self.next, item);
        self.next += 1;
        self.last = None;
        self.list.changed()
    }
}

/// Mutable window `start..end` of an [`ObservableList`].
pub struct SubList<'a, T> {
    list: &'a mut ObservableList<T>,
    start: usize,
    end: usize,
}

impl<T> SubList<'_, T> {
    /// Elements in the window.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.list.items[self.start..self.end]
    }

    /// Number of elements in the window.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn absolute(&self, index: usize, len: usize) -> PrefsResult<usize> {
        if index < len {
            Ok(self.start + index)
        } else {
            Err(PrefsError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }

    /// Appends `item` at the end of the window.
    pub fn push(&mut self, item: T) -> PrefsResult<()> {
        self.list.items.insert(self.end, item);
        self.end += 1;
        self.list.changed()
    }

    /// Inserts `item` at window-relative `index`.
    pub fn insert(&mut self, index: usize, item: T) -> PrefsResult<()> {
        let at = self.absolute(index, self.len() + 1)?;
        self.list.items.insert(at, item);
        self.end += 1;
        self.list.changed()
    }

    /// Replaces the element at window-relative `index`.
    pub fn set(&mut self, index: usize, item: T) -> PrefsResult<T> {
        let at = self.absolute(index, self.len())?;
        let previous = std::mem::replace(&mut self.list.items[at], item);
        self.list.changed().map(|()| previous)
    }

    /// Removes the element at window-relative `index`.
    pub fn remove(&mut self, index: usize) -> PrefsResult<T> {
        let at = self.absolute(index, self.len())?;
        let removed = self.list.items.remove(at);
        self.end -= 1;
        self.list.changed().map(|()| removed)
    }

    /// Removes every element of the window from the parent list.
    pub fn clear(&mut self) -> PrefsResult<()> {
        self.list.items.drain(self.start..self.end);
        self.end = self.start;
        self.list.changed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<Vec<i32>>>>;

    fn observed(items: Vec<i32>) -> (ObservableList<i32>, Log) {
        let log: Log = Arc::default();
        let sink = log.clone();
        let list = ObservableList::new(items, move |items: &Vec<i32>| {
            sink.lock().unwrap().push(items.clone());
            Ok(())
        });
        (list, log)
    }

    #[test]
    fn test_every_mutation_notifies_with_full_list() {
        let (mut list, log) = observed(vec![1, 2, 3]);
        list.push(4).unwrap();
        list.insert(0, 0).unwrap();
        assert_eq!(list.remove(1).unwrap(), 1);
        assert_eq!(list.set(0, 9).unwrap(), 0);
        list.retain(|x| *x != 3).unwrap();
        list.extend([5, 6]).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                vec![1, 2, 3, 4],
                vec![0, 1, 2, 3, 4],
                vec![0, 2, 3, 4],
                vec![9, 2, 3, 4],
                vec![9, 2, 4],
                vec![9, 2, 4, 5, 6],
            ]
        );
        assert_eq!(*list, vec![9, 2, 4, 5, 6]);
    }

    #[test]
    fn test_noop_mutations_still_notify() {
        let (mut list, log) = observed(Vec::new());
        list.clear().unwrap();
        assert!(!list.remove_item(&7).unwrap());
        assert_eq!(list.pop().unwrap(), None);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_index_errors() {
        let (mut list, log) = observed(vec![1]);
        match list.remove(5) {
            Err(PrefsError::IndexOutOfBounds { index, len }) => {
                assert_eq!((index, len), (5, 1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(list.insert(3, 0).is_err());
        assert!(list.set(1, 0).is_err());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_callback_error_is_returned_after_mutation() {
        let mut list = ObservableList::new(vec![1], |_: &Vec<i32>| {
            Err(PrefsError::backing("disk full"))
        });
        assert!(matches!(list.push(2), Err(PrefsError::Backing(_))));
        assert_eq!(*list, vec![1, 2]);
    }

    #[test]
    fn test_cursor_remove_set_add() {
        let (mut list, log) = observed(vec![1, 2, 3]);
        {
            let mut cursor = list.cursor();
            assert!(matches!(cursor.remove(), Err(PrefsError::IllegalState(_))));
            assert_eq!(cursor.next_item(), Some(&1));
            assert_eq!(cursor.next_item(), Some(&2));
            assert_eq!(cursor.remove().unwrap(), 2);
            assert!(matches!(cursor.set(7), Err(PrefsError::IllegalState(_))));
            assert_eq!(cursor.next_item(), Some(&3));
            cursor.set(30).unwrap();
            cursor.add(40).unwrap();
            assert!(!cursor.has_next());
            assert_eq!(cursor.previous_item(), Some(&40));
            assert_eq!(cursor.previous_index(), Some(1));
        }
        assert_eq!(*list, vec![1, 30, 40]);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_cursor_at_end_and_backwards_remove() {
        let (mut list, _) = observed(vec![1, 2, 3]);
        let mut cursor = list.cursor_at(3).unwrap();
        assert_eq!(cursor.previous_item(), Some(&3));
        cursor.remove().unwrap();
        assert_eq!(cursor.next_index(), 2);
        assert_eq!(cursor.previous_item(), Some(&2));
        assert!(list.cursor_at(4).is_err());
    }

    #[test]
    fn test_sub_list_routes_through_parent() {
        let (mut list, log) = observed(vec![0, 1, 2, 3, 4]);
        {
            let mut sub = list.sub_list(1..3).unwrap();
            assert_eq!(sub.as_slice(), &[1, 2]);
            sub.push(9).unwrap();
            assert_eq!(sub.remove(0).unwrap(), 1);
            assert_eq!(sub.set(0, 20).unwrap(), 2);
            sub.insert(0, 10).unwrap();
            assert_eq!(sub.as_slice(), &[10, 20, 9]);
            assert!(sub.remove(3).is_err());
        }
        assert_eq!(*list, vec![0, 10, 20, 9, 3, 4]);
        list.sub_list(1..4).unwrap().clear().unwrap();
        assert_eq!(*list, vec![0, 3, 4]);
        assert_eq!(log.lock().unwrap().len(), 5);
        assert!(list.sub_list(2..9).is_err());
    }

    #[test]
    fn test_into_inner() {
        let (list, _) = observed(vec![1, 2]);
        assert_eq!(list.into_inner(), vec![1, 2]);
    }
}

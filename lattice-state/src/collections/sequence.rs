//! Observable Sequence
//!
//! `ObservableSequence<T>` is an ordered, index-addressable list that emits
//! a change signal after every operation that actually modified it.
//!
//! # Emission Rules
//!
//! - Exactly one signal per successful mutating call. Bulk operations
//!   (`extend`, `insert_many`, `remove_range`, `remove_all`) emit once for
//!   the whole batch.
//! - Calls that leave the contents untouched emit nothing: `pop` on an empty
//!   sequence, `clear` of an empty sequence, `remove_all` matching nothing,
//!   sorting an already ordered range, `trim_excess` that frees nothing.
//! - Indexed assignment and `reverse` over two or more elements always emit.
//!   Detecting an unchanged result there would need `T: PartialEq`.
//! - Reads never emit.
//!
//! Listeners run after the internal borrow is released, so they are free to
//! read the sequence (or mutate it again, which re-enters emission).
//!
//! # Sharing
//!
//! The sequence is a handle: clones share storage and listeners. Two handles
//! compare equal when they point at the same storage.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::signal::ChangeSignal;

/// An ordered list that signals on every mutation.
pub struct ObservableSequence<T> {
    items: Rc<RefCell<Vec<T>>>,
    signal: ChangeSignal,
}

impl<T> ObservableSequence<T> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an empty sequence with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Wrap an existing vector. No signal is emitted.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
            signal: ChangeSignal::new(),
        }
    }

    /// Handle to this sequence's change signal.
    pub fn signal(&self) -> ChangeSignal {
        self.signal.clone()
    }

    /// Check whether two handles share storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Run `op` against the storage and emit if it reports a change.
    fn mutate<R>(&self, op: impl FnOnce(&mut Vec<T>) -> (R, bool)) -> R {
        let (result, changed) = op(&mut self.items.borrow_mut());
        if changed {
            self.signal.emit();
        }
        result
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the sequence has no items.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.items.borrow().capacity()
    }

    /// Borrow the items as a slice for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }

    /// Index of the first item matching `predicate`.
    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.borrow().iter().position(predicate)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append an item.
    pub fn push(&self, value: T) {
        self.mutate(|items| {
            items.push(value);
            ((), true)
        })
    }

    /// Append every item produced by `values`, emitting once.
    pub fn extend<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.mutate(|items| {
            let before = items.len();
            items.extend(values);
            ((), items.len() != before)
        })
    }

    /// Insert an item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) {
        self.mutate(|items| {
            items.insert(index, value);
            ((), true)
        })
    }

    /// Insert every item produced by `values` starting at `index`, emitting
    /// once.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_many<I>(&self, index: usize, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.mutate(|items| {
            let before = items.len();
            drop(items.splice(index..index, values));
            ((), items.len() != before)
        })
    }

    /// Remove and return the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&self, index: usize) -> T {
        self.mutate(|items| (items.remove(index), true))
    }

    /// Remove `count` items starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the end.
    pub fn remove_range(&self, index: usize, count: usize) {
        self.mutate(|items| {
            drop(items.drain(index..index + count));
            ((), count > 0)
        })
    }

    /// Remove every item matching `predicate`. Returns how many were removed.
    pub fn remove_all(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            let removed = before - items.len();
            (removed, removed > 0)
        })
    }

    /// Keep only the items matching `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) {
        self.remove_all(|item| !keep(item));
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Option<T> {
        self.mutate(|items| {
            let popped = items.pop();
            let changed = popped.is_some();
            (popped, changed)
        })
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.mutate(|items| {
            let changed = !items.is_empty();
            items.clear();
            ((), changed)
        })
    }

    /// Replace the item at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: T) -> T {
        self.mutate(|items| (std::mem::replace(&mut items[index], value), true))
    }

    /// Mutate the item at `index` in place.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn update<R>(&self, index: usize, f: impl FnOnce(&mut T) -> R) -> R {
        self.mutate(|items| (f(&mut items[index]), true))
    }

    /// Stable sort with a comparator.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.mutate(|items| ((), sort_slice_by(items, compare)))
    }

    /// Stable sort by a derived key.
    pub fn sort_by_key<K: Ord>(&self, mut key: impl FnMut(&T) -> K) {
        self.sort_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Stable sort of `count` items starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the end.
    pub fn sort_range_by(
        &self,
        index: usize,
        count: usize,
        compare: impl FnMut(&T, &T) -> Ordering,
    ) {
        self.mutate(|items| ((), sort_slice_by(&mut items[index..index + count], compare)))
    }

    /// Reverse the whole sequence.
    pub fn reverse(&self) {
        self.mutate(|items| {
            items.reverse();
            ((), items.len() > 1)
        })
    }

    /// Reverse `count` items starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the end.
    pub fn reverse_range(&self, index: usize, count: usize) {
        self.mutate(|items| {
            items[index..index + count].reverse();
            ((), count > 1)
        })
    }

    /// Release unused capacity.
    pub fn trim_excess(&self) {
        self.mutate(|items| {
            let before = items.capacity();
            items.shrink_to_fit();
            ((), items.capacity() != before)
        })
    }
}

impl<T: Clone> ObservableSequence<T> {
    /// Clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    /// Clone of the first item.
    pub fn first(&self) -> Option<T> {
        self.items.borrow().first().cloned()
    }

    /// Clone of the last item.
    pub fn last(&self) -> Option<T> {
        self.items.borrow().last().cloned()
    }

    /// Copy the items out.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }
}

impl<T: PartialEq> ObservableSequence<T> {
    /// Whether an equal item is present.
    pub fn contains(&self, value: &T) -> bool {
        self.items.borrow().contains(value)
    }

    /// Remove the first item equal to `value`. Returns whether one was found.
    pub fn remove(&self, value: &T) -> bool {
        self.mutate(|items| match items.iter().position(|item| item == value) {
            Some(index) => {
                items.remove(index);
                (true, true)
            }
            None => (false, false),
        })
    }
}

impl<T: Ord> ObservableSequence<T> {
    /// Stable sort using the natural order.
    pub fn sort(&self) {
        self.sort_by(T::cmp)
    }
}

/// Sort `slice` unless it is already ordered. Returns whether it was sorted.
fn sort_slice_by<T>(slice: &mut [T], mut compare: impl FnMut(&T, &T) -> Ordering) -> bool {
    if slice
        .windows(2)
        .all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater)
    {
        return false;
    }
    slice.sort_by(compare);
    true
}

impl<T> Clone for ObservableSequence<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            signal: self.signal.clone(),
        }
    }
}

impl<T> Default for ObservableSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ObservableSequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> FromIterator<T> for ObservableSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Handles are equal when they share storage.
impl<T> PartialEq for ObservableSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for ObservableSequence<T> {}

impl<T: fmt::Debug> fmt::Debug for ObservableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSequence")
            .field("items", &*self.items.borrow())
            .field("listener_count", &self.signal.listener_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

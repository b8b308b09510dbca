//! Observable Map
//!
//! `ObservableMap<K, V>` is a key-unique mapping that emits a change signal
//! after every operation that changed its key set or one of its values.
//!
//! Entries are stored in an `IndexMap`, so iteration follows insertion order
//! and removals preserve the relative order of the remaining entries. Callers
//! should not rely on order for anything semantic.
//!
//! | Operation       | Signals when                          |
//! |-----------------|---------------------------------------|
//! | `insert`        | always (add or assign)                |
//! | `add`           | the key was absent                    |
//! | `update`        | the key was present                   |
//! | `remove`        | the key was present                   |
//! | `clear`         | the map was non-empty                 |
//! | `extend`        | at least one entry was supplied       |
//! | `remove_many`   | at least one key was present          |
//!
//! Bulk operations emit at most one signal.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{Equivalent, IndexMap};

use super::signal::ChangeSignal;
use crate::error::{Result, StateError};

/// A key-unique mapping that signals on every mutation.
pub struct ObservableMap<K, V> {
    entries: Rc<RefCell<IndexMap<K, V>>>,
    signal: ChangeSignal,
}

impl<K, V> ObservableMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::from_index_map(IndexMap::new())
    }

    /// Wrap an existing map. No signal is emitted.
    pub fn from_index_map(entries: IndexMap<K, V>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(entries)),
            signal: ChangeSignal::new(),
        }
    }

    /// Handle to this map's change signal.
    pub fn signal(&self) -> ChangeSignal {
        self.signal.clone()
    }

    /// Check whether two handles share storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Borrow the entries for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<K, V>) -> R) -> R {
        f(&self.entries.borrow())
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.mutate(|entries| {
            let changed = !entries.is_empty();
            entries.clear();
            ((), changed)
        })
    }

    fn mutate<R>(&self, op: impl FnOnce(&mut IndexMap<K, V>) -> (R, bool)) -> R {
        let (result, changed) = op(&mut self.entries.borrow_mut());
        if changed {
            self.signal.emit();
        }
        result
    }
}

impl<K: Hash + Eq, V> ObservableMap<K, V> {
    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.borrow().contains_key(key)
    }

    /// Insert or overwrite the value for `key`, returning the previous value.
    ///
    /// This is the indexed-assignment form and always signals.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.mutate(|entries| (entries.insert(key, value), true))
    }

    /// Insert a new entry.
    ///
    /// Fails with [`StateError::DuplicateKey`] if `key` is already present;
    /// the map is left untouched and nothing is emitted.
    pub fn add(&self, key: K, value: V) -> Result<()> {
        self.mutate(|entries| {
            if entries.contains_key(&key) {
                return (Err(StateError::DuplicateKey), false);
            }
            entries.insert(key, value);
            (Ok(()), true)
        })
    }

    /// Replace the value for `key` only if it is present.
    ///
    /// Returns whether the value was replaced.
    pub fn update<Q>(&self, key: &Q, value: V) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.mutate(|entries| match entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Remove the entry for `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.mutate(|entries| {
            let removed = entries.shift_remove(key);
            let changed = removed.is_some();
            (removed, changed)
        })
    }

    /// Insert or overwrite every supplied entry, emitting once.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.mutate(|entries| {
            let mut changed = false;
            for (key, value) in items {
                entries.insert(key, value);
                changed = true;
            }
            ((), changed)
        })
    }

    /// Remove every supplied key, emitting once if any was present.
    ///
    /// Returns how many entries were removed.
    pub fn remove_many<I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        self.mutate(|entries| {
            let removed = keys
                .into_iter()
                .filter(|key| entries.shift_remove(key).is_some())
                .count();
            (removed, removed > 0)
        })
    }
}

impl<K: Hash + Eq, V: Clone> ObservableMap<K, V> {
    /// Clone of the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.borrow().get(key).cloned()
    }

    /// Clones of every value, in iteration order.
    pub fn values(&self) -> Vec<V> {
        self.entries.borrow().values().cloned().collect()
    }
}

impl<K: Clone, V> ObservableMap<K, V> {
    /// Clones of every key, in iteration order.
    pub fn keys(&self) -> Vec<K> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl<K: Hash + Eq, V: PartialEq> ObservableMap<K, V> {
    /// Whether `key` maps to a value equal to `value`.
    pub fn contains_entry<Q>(&self, key: &Q, value: &V) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries
            .borrow()
            .get(key)
            .is_some_and(|existing| existing == value)
    }
}

impl<K: Clone, V: Clone> ObservableMap<K, V> {
    /// Copy the entries out.
    pub fn to_index_map(&self) -> IndexMap<K, V> {
        self.entries.borrow().clone()
    }
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            signal: self.signal.clone(),
        }
    }
}

impl<K, V> Default for ObservableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for ObservableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_index_map(iter.into_iter().collect())
    }
}

/// Handles are equal when they share storage.
impl<K, V> PartialEq for ObservableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<K, V> Eq for ObservableMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("entries", &*self.entries.borrow())
            .field("listener_count", &self.signal.listener_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Listener;
    use std::cell::Cell;

    fn counted<K, V>(map: &ObservableMap<K, V>) -> Rc<Cell<usize>> {
        let signals = Rc::new(Cell::new(0));
        let signals_clone = signals.clone();
        map.signal()
            .attach(Listener::new(move || signals_clone.set(signals_clone.get() + 1)));
        signals
    }

    #[test]
    fn insert_signals_for_add_and_assign() {
        let map = ObservableMap::new();
        let signals = counted(&map);

        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("a", 2), Some(1));

        assert_eq!(map.get("a"), Some(2));
        assert_eq!(signals.get(), 2);
    }

    #[test]
    fn add_rejects_existing_key_without_signal() {
        let map = ObservableMap::new();
        let signals = counted(&map);

        assert_eq!(map.add("a".to_string(), 1), Ok(()));
        assert_eq!(map.add("a".to_string(), 2), Err(StateError::DuplicateKey));

        assert_eq!(map.get("a"), Some(1));
        assert_eq!(signals.get(), 1);
    }

    #[test]
    fn remove_and_update_of_absent_key_are_silent() {
        let map: ObservableMap<String, i32> = ObservableMap::new();
        let signals = counted(&map);

        assert_eq!(map.remove("missing"), None);
        assert!(!map.update("missing", 3));
        map.clear();
        assert_eq!(map.remove_many(vec!["x".to_string()]), 0);
        map.extend(Vec::new());

        assert!(map.is_empty());
        assert_eq!(signals.get(), 0);
    }

    #[test]
    fn update_applies_only_to_present_key() {
        let map: ObservableMap<String, i32> =
            [("a".to_string(), 1)].into_iter().collect();
        let signals = counted(&map);

        assert!(map.update("a", 10));
        assert_eq!(map.get("a"), Some(10));
        assert!(!map.contains_key("b"));
        assert_eq!(signals.get(), 1);
    }

    #[test]
    fn bulk_operations_signal_once() {
        let map = ObservableMap::new();
        let signals = counted(&map);

        map.extend([(1, "one"), (2, "two"), (3, "three")]);
        assert_eq!(map.len(), 3);
        assert_eq!(signals.get(), 1);

        assert_eq!(map.remove_many([1, 3, 7]), 2);
        assert_eq!(map.keys(), vec![2]);
        assert_eq!(signals.get(), 2);
    }

    #[test]
    fn remove_preserves_order_of_remaining_entries() {
        let map: ObservableMap<u8, char> = [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();

        assert_eq!(map.remove(&1), Some('a'));
        assert_eq!(map.keys(), vec![2, 3]);
        assert_eq!(map.values(), vec!['b', 'c']);
    }

    #[test]
    fn contains_entry_compares_values_without_signal() {
        let map: ObservableMap<&str, i32> = [("a", 1)].into_iter().collect();
        let signals = counted(&map);

        assert!(map.contains_entry("a", &1));
        assert!(!map.contains_entry("a", &2));
        assert!(!map.contains_entry("b", &1));
        assert_eq!(signals.get(), 0);
    }

    #[test]
    fn clear_signals_when_non_empty() {
        let map: ObservableMap<u8, u8> = [(1, 1)].into_iter().collect();
        let signals = counted(&map);

        map.clear();
        map.clear();
        assert_eq!(signals.get(), 1);
        assert_eq!(map.to_index_map().len(), 0);
    }
}

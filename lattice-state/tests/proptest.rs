//! Property-based tests for the observable collections using proptest.
//!
//! Each test drives a container and a plain model with the same random
//! operations and checks that the container emitted exactly one signal per
//! operation that changed the model. Indexed assignment and reversal of two
//! or more items always signal, whether or not the contents moved.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use lattice_state::collections::{ChangeSignal, Listener, ObservableMap, ObservableSequence};
use proptest::prelude::*;

fn count_signals(signal: ChangeSignal) -> Rc<Cell<usize>> {
    let signals = Rc::new(Cell::new(0));
    let signals_clone = signals.clone();
    signal.attach(Listener::new(move || signals_clone.set(signals_clone.get() + 1)));
    signals
}

#[derive(Debug, Clone)]
enum SeqOp {
    Push(u8),
    Pop,
    Clear,
    Extend(Vec<u8>),
    Remove(u8),
    RemoveAll(u8),
    Sort,
    InsertMany(usize, Vec<u8>),
    RemoveRange(usize, usize),
    Set(usize, u8),
    Reverse,
    ReverseRange(usize, usize),
    SortRange(usize, usize),
    TrimExcess,
}

/// Clamp a random `(index, count)` pair to a valid range of a `len` list.
fn span(len: usize, index: usize, count: usize) -> (usize, usize) {
    let index = index % (len + 1);
    (index, count.min(len - index))
}

fn seq_op() -> impl Strategy<Value = SeqOp> {
    prop_oneof![
        (0u8..6).prop_map(SeqOp::Push),
        Just(SeqOp::Pop),
        Just(SeqOp::Clear),
        prop::collection::vec(0u8..6, 0..4).prop_map(SeqOp::Extend),
        (0u8..6).prop_map(SeqOp::Remove),
        (0u8..6).prop_map(SeqOp::RemoveAll),
        Just(SeqOp::Sort),
        (any::<usize>(), prop::collection::vec(0u8..6, 0..3))
            .prop_map(|(i, values)| SeqOp::InsertMany(i, values)),
        (any::<usize>(), 0usize..4).prop_map(|(i, n)| SeqOp::RemoveRange(i, n)),
        (any::<usize>(), 0u8..6).prop_map(|(i, v)| SeqOp::Set(i, v)),
        Just(SeqOp::Reverse),
        (any::<usize>(), 0usize..4).prop_map(|(i, n)| SeqOp::ReverseRange(i, n)),
        (any::<usize>(), 0usize..5).prop_map(|(i, n)| SeqOp::SortRange(i, n)),
        Just(SeqOp::TrimExcess),
    ]
}

/// Apply `op` to the model.
fn apply_to_model(model: &mut Vec<u8>, op: &SeqOp) {
    let len = model.len();
    match op {
        SeqOp::Push(v) => model.push(*v),
        SeqOp::Pop => {
            model.pop();
        }
        SeqOp::Clear => model.clear(),
        SeqOp::Extend(values) => model.extend(values),
        SeqOp::Remove(v) => {
            if let Some(index) = model.iter().position(|x| x == v) {
                model.remove(index);
            }
        }
        SeqOp::RemoveAll(v) => model.retain(|x| x != v),
        SeqOp::Sort => model.sort(),
        SeqOp::InsertMany(i, values) => {
            let (index, _) = span(len, *i, 0);
            drop(model.splice(index..index, values.iter().copied()));
        }
        SeqOp::RemoveRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            drop(model.drain(index..index + count));
        }
        SeqOp::Set(i, v) => {
            if len > 0 {
                model[i % len] = *v;
            }
        }
        SeqOp::Reverse => model.reverse(),
        SeqOp::ReverseRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            model[index..index + count].reverse();
        }
        SeqOp::SortRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            model[index..index + count].sort();
        }
        SeqOp::TrimExcess => {}
    }
}

/// Whether `op` is expected to signal, given the model before and after it.
///
/// `TrimExcess` depends on allocator behaviour and is checked separately.
fn seq_op_signals(before: &[u8], after: &[u8], op: &SeqOp) -> bool {
    match op {
        SeqOp::Set(..) => !before.is_empty(),
        SeqOp::Reverse => before.len() > 1,
        SeqOp::ReverseRange(i, n) => span(before.len(), *i, *n).1 > 1,
        _ => before != after,
    }
}

fn apply_to_sequence(sequence: &ObservableSequence<u8>, op: &SeqOp) {
    let len = sequence.len();
    match op {
        SeqOp::Push(v) => sequence.push(*v),
        SeqOp::Pop => {
            sequence.pop();
        }
        SeqOp::Clear => sequence.clear(),
        SeqOp::Extend(values) => sequence.extend(values.iter().copied()),
        SeqOp::Remove(v) => {
            sequence.remove(v);
        }
        SeqOp::RemoveAll(v) => {
            sequence.remove_all(|x| x == v);
        }
        SeqOp::Sort => sequence.sort(),
        SeqOp::InsertMany(i, values) => {
            let (index, _) = span(len, *i, 0);
            sequence.insert_many(index, values.iter().copied());
        }
        SeqOp::RemoveRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            sequence.remove_range(index, count);
        }
        SeqOp::Set(i, v) => {
            if len > 0 {
                sequence.set(i % len, *v);
            }
        }
        SeqOp::Reverse => sequence.reverse(),
        SeqOp::ReverseRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            sequence.reverse_range(index, count);
        }
        SeqOp::SortRange(i, n) => {
            let (index, count) = span(len, *i, *n);
            sequence.sort_range_by(index, count, u8::cmp);
        }
        SeqOp::TrimExcess => sequence.trim_excess(),
    }
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u8),
    Add(u8, u8),
    Update(u8, u8),
    Remove(u8),
    RemoveMany(Vec<u8>),
    Extend(Vec<(u8, u8)>),
    Clear,
}

fn map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (0u8..8, any::<u8>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        (0u8..8, any::<u8>()).prop_map(|(k, v)| MapOp::Add(k, v)),
        (0u8..8, any::<u8>()).prop_map(|(k, v)| MapOp::Update(k, v)),
        (0u8..8).prop_map(MapOp::Remove),
        prop::collection::vec(0u8..8, 0..4).prop_map(MapOp::RemoveMany),
        prop::collection::vec((0u8..8, any::<u8>()), 0..3).prop_map(MapOp::Extend),
        Just(MapOp::Clear),
    ]
}

/// Whether `op` is expected to signal given the model before it runs.
fn map_op_signals(model: &HashMap<u8, u8>, op: &MapOp) -> bool {
    match op {
        MapOp::Insert(..) => true,
        MapOp::Add(k, _) => !model.contains_key(k),
        MapOp::Update(k, _) | MapOp::Remove(k) => model.contains_key(k),
        MapOp::RemoveMany(keys) => keys.iter().any(|k| model.contains_key(k)),
        MapOp::Extend(entries) => !entries.is_empty(),
        MapOp::Clear => !model.is_empty(),
    }
}

fn apply_to_map_model(model: &mut HashMap<u8, u8>, op: &MapOp) {
    match op {
        MapOp::Insert(k, v) => {
            model.insert(*k, *v);
        }
        MapOp::Add(k, v) => {
            model.entry(*k).or_insert(*v);
        }
        MapOp::Update(k, v) => {
            if let Some(slot) = model.get_mut(k) {
                *slot = *v;
            }
        }
        MapOp::Remove(k) => {
            model.remove(k);
        }
        MapOp::RemoveMany(keys) => {
            for k in keys {
                model.remove(k);
            }
        }
        MapOp::Extend(entries) => model.extend(entries.iter().copied()),
        MapOp::Clear => model.clear(),
    }
}

fn apply_to_map(map: &ObservableMap<u8, u8>, op: &MapOp) {
    match op {
        MapOp::Insert(k, v) => {
            map.insert(*k, *v);
        }
        MapOp::Add(k, v) => {
            let _ = map.add(*k, *v);
        }
        MapOp::Update(k, v) => {
            map.update(k, *v);
        }
        MapOp::Remove(k) => {
            map.remove(k);
        }
        MapOp::RemoveMany(keys) => {
            map.remove_many(keys.iter().copied());
        }
        MapOp::Extend(entries) => map.extend(entries.iter().copied()),
        MapOp::Clear => map.clear(),
    }
}

proptest! {
    /// Signals equal the number of operations that changed the contents.
    #[test]
    fn sequence_signals_match_changes(ops in prop::collection::vec(seq_op(), 0..64)) {
        let sequence = ObservableSequence::new();
        let signals = count_signals(sequence.signal());
        let mut model = Vec::new();
        let mut expected = 0;

        for op in &ops {
            let before = model.clone();
            let capacity = sequence.capacity();
            apply_to_model(&mut model, op);
            apply_to_sequence(&sequence, op);

            let signalled = match op {
                SeqOp::TrimExcess => sequence.capacity() != capacity,
                _ => seq_op_signals(&before, &model, op),
            };
            if signalled {
                expected += 1;
            }
        }

        prop_assert_eq!(sequence.to_vec(), model);
        prop_assert_eq!(signals.get(), expected);
    }

    /// A map operation signals iff it changed the mapping, or assigned a key.
    #[test]
    fn map_signals_match_changes(ops in prop::collection::vec(map_op(), 0..64)) {
        let map = ObservableMap::new();
        let signals = count_signals(map.signal());
        let mut model = HashMap::new();
        let mut expected = 0;

        for op in &ops {
            if map_op_signals(&model, op) {
                expected += 1;
            }
            apply_to_map_model(&mut model, op);
            apply_to_map(&map, op);
        }

        let actual: HashMap<u8, u8> = map.to_index_map().into_iter().collect();
        prop_assert_eq!(actual, model);
        prop_assert_eq!(signals.get(), expected);
    }
}

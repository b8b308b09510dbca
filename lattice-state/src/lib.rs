//! Lattice State
//!
//! This crate provides observable state for the Lattice reactive UI framework.
//! It implements:
//!
//! - Observable collections that signal on every mutation
//! - Write interception for declared state members, with no-op suppression
//! - A subscription registry that wires nested collections into the same
//!   notification stream
//!
//! Nothing here tracks dependencies or memoises derived values. A state
//! instance has a flat list of subscribers, and every observable change
//! notifies all of them.
//!
//! # Architecture
//!
//! - `collections`: `ObservableSequence`, `ObservableMap`, and the
//!   `ChangeSignal` they emit through
//! - `state`: the `ReactiveState` trait, the `Reactive` instance handle, the
//!   interceptor, and the observer binding
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_state::collections::ObservableSequence;
//! use lattice_state::state::{Members, Property, Reactive, ReactiveState, Subscriber};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//!     items: ObservableSequence<String>,
//! }
//!
//! impl Counter {
//!     fn count() -> Property<Self, i32> {
//!         Property::new("count", |c| &c.count, |c| &mut c.count)
//!     }
//!
//!     fn items() -> Property<Self, ObservableSequence<String>> {
//!         Property::new("items", |c| &c.items, |c| &mut c.items)
//!     }
//! }
//!
//! impl ReactiveState for Counter {
//!     fn declare(members: &mut Members<Self>) {
//!         members.property(Self::count()).observable();
//!         members.sequence(Self::items()).observable();
//!     }
//! }
//!
//! let counter = Reactive::<Counter>::create()?;
//! counter.subscribe(&Subscriber::new(|| println!("changed")));
//!
//! counter.set(&Counter::count(), 0); // equal value, nothing printed
//! counter.set(&Counter::count(), 5); // prints "changed"
//! counter.get(&Counter::items()).push("x".into()); // prints "changed"
//! ```

pub mod collections;
pub mod state;

mod error;

pub use error::{Result, StateError};

//! Observable Collections
//!
//! Container types that behave like their plain counterparts but emit a
//! change signal after every mutation that actually changed them.
//!
//! - [`ObservableSequence`]: an ordered list, modelled on `Vec<T>`.
//! - [`ObservableMap`]: a key-unique mapping, backed by `IndexMap<K, V>`.
//! - [`ChangeSignal`]: the listener list both containers emit through.
//!
//! Containers do not track subscribers themselves. They accept parameterless
//! [`Listener`]s, and the state that owns a container attaches exactly one
//! listener (its notifier) when it discovers the container. See
//! [`crate::state`] for the discovery side.
//!
//! Emission is synchronous, on the calling thread, after the container has
//! released its internal borrow.

mod map;
mod sequence;
mod signal;

pub use map::ObservableMap;
pub use sequence::ObservableSequence;
pub use signal::{ChangeSignal, Listener};

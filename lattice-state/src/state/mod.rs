//! Reactive State
//!
//! This module turns plain state types into observable ones.
//!
//! # Concepts
//!
//! ## Declared Members
//!
//! A state type implements [`ReactiveState`] and lists its members in
//! [`ReactiveState::declare`]. Each member is declared with a [`Property`]
//! (a name plus read/write accessors) and can be flagged observable. The
//! declaration is validated once per type: an observable member must be
//! overridable, i.e. declared with a write accessor.
//!
//! ## Interception
//!
//! [`Reactive<S>`] is the instance application code holds. Writes made with
//! [`Reactive::set`] pass through the [`ChangeInterceptor`], which notifies
//! subscribers when an observable member actually changes value. Reads and
//! other calls go straight to the state.
//!
//! ## Auto-wiring
//!
//! Observable members of container type ([`ObservableSequence`] and
//! [`ObservableMap`]) are discovered on every subscribe and unsubscribe. The
//! state attaches its notifier to each discovered container, so mutating a
//! container notifies the same subscribers a member write would.
//!
//! [`ObservableSequence`]: crate::collections::ObservableSequence
//! [`ObservableMap`]: crate::collections::ObservableMap
//!
//! # Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and synchronous. A
//! notification runs to completion on the thread that caused it.

mod interceptor;
mod observer;
mod property;
mod reactive;
mod schema;
mod subscriber;

pub use interceptor::{ChangeInterceptor, WriteOutcome};
pub use observer::Observer;
pub use property::Property;
pub use reactive::{Reactive, ReactiveState, StateSlot, Subscribable};
pub use schema::{MemberDecl, MemberKind, Members, Schema};
pub use subscriber::{Subscriber, SubscriberId};

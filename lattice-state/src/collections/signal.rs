//! Change Signal
//!
//! A `ChangeSignal` is the emission side of every observable container. It
//! holds an ordered list of parameterless listeners and invokes them,
//! synchronously and in attachment order, whenever the container reports a
//! mutation.
//!
//! # Identity
//!
//! Listeners compare by identity, not by behaviour. Cloning a [`Listener`]
//! yields a value equal to the original, which is what lets an owner attach
//! a listener when a container is discovered and detach the very same
//! listener later.
//!
//! # Re-entrancy
//!
//! `emit` iterates a snapshot of the listener list. A listener may attach or
//! detach listeners (including itself) while it runs; the change takes
//! effect on the next emission.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Most containers are owned by exactly one state, so one inline slot is the
/// common case. The second slot covers a container shared by two states.
type ListenerList = SmallVec<[Listener; 2]>;

/// A parameterless change callback with identity semantics.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn()>);

impl Listener {
    /// Wrap a closure as a listener.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self(Rc::new(callback))
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.0)();
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.addr()).finish()
    }
}

/// Shared, ordered listener list.
///
/// Cloning a `ChangeSignal` yields another handle to the same list.
#[derive(Clone, Default)]
pub struct ChangeSignal {
    listeners: Rc<RefCell<ListenerList>>,
}

impl ChangeSignal {
    /// Create a signal with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener.
    ///
    /// Returns `false` without attaching if the same listener is already
    /// attached, so repeated discovery never doubles notifications.
    pub fn attach(&self, listener: Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Detach a listener. Returns whether it was attached.
    pub fn detach(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|attached| attached != listener);
        listeners.len() != before
    }

    /// Check whether a listener is attached.
    pub fn is_attached(&self, listener: &Listener) -> bool {
        self.listeners.borrow().contains(listener)
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Invoke every attached listener in attachment order.
    pub fn emit(&self) {
        let snapshot: ListenerList = self.listeners.borrow().clone();
        for listener in &snapshot {
            listener.call();
        }
    }

    /// Check whether two handles share the same listener list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }
}

impl fmt::Debug for ChangeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSignal")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

//! Subscriber types for the state registry.
//!
//! A Subscriber is a callback registered against a reactive state, typically
//! by a UI binding that re-renders when the state changes.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a subscriber within the registry.
///
/// Subscribers hold an `Rc` callback and never leave the thread that built
/// them, so ids only need to be distinct per thread. Duplicate detection and
/// removal both compare ids, never callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// A subscriber to state changes.
///
/// Cloning a subscriber keeps its ID, so the clone registers and unregisters
/// as the same subscriber. Two subscribers created separately are always
/// distinct, even when built from the same closure.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    /// The callback to invoke when the observed state changes.
    notify: Rc<dyn Fn()>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            id: SubscriberId::next(),
            notify: Rc::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that the observed state changed.
    pub fn notify(&self) {
        (self.notify)();
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separately_built_subscribers_are_distinct() {
        let ids: Vec<_> = (0..3).map(|_| Subscriber::new(|| {}).id()).collect();

        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert!(ids[0].0 < ids[2].0);
    }

    #[test]
    fn subscriber_notify_calls_callback() {
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let subscriber = Subscriber::new(move || {
            called_clone.set(true);
        });

        assert!(!called.get());
        subscriber.notify();
        assert!(called.get());
    }

    #[test]
    fn clones_are_the_same_subscriber() {
        let subscriber = Subscriber::new(|| {});
        let clone = subscriber.clone();
        let other = Subscriber::new(|| {});

        assert_eq!(subscriber, clone);
        assert_eq!(subscriber.id(), clone.id());
        assert_ne!(subscriber, other);
    }
}

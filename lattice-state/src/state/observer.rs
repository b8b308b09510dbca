//! Observer Binding
//!
//! An `Observer` is the piece a UI component holds to stay in sync with a
//! reactive state. It owns a single [`Subscriber`] built from the
//! component's change callback, registers it on [`Observer::initialize`],
//! and unregisters the very same subscriber on [`Observer::dispose`] or
//! drop. Keeping one subscriber value for both calls is what makes
//! deregistration reliable.
//!
//! Beware of reference cycles: a change callback that captures the state
//! handle it observes keeps that state alive through the registry.

use tracing::debug;

use super::reactive::Subscribable;
use super::subscriber::Subscriber;
use crate::error::{Result, StateError};

/// Lifecycle binding between a component and a state it observes.
pub struct Observer<R: Subscribable> {
    state: Option<R>,
    subscriber: Subscriber,
    active: bool,
}

impl<R: Subscribable> Observer<R> {
    /// Create an observer that calls `on_change` whenever `state` changes.
    ///
    /// Nothing is registered until [`Observer::initialize`].
    pub fn new<F>(state: Option<R>, on_change: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            state,
            subscriber: Subscriber::new(on_change),
            active: false,
        }
    }

    /// Subscribe to the state.
    ///
    /// Fails with [`StateError::MissingState`] if the observer was built
    /// without a state. Calling it again while active does nothing.
    pub fn initialize(&mut self) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or(StateError::MissingState { binding: "Observer" })?;

        if !self.active {
            state.subscribe(&self.subscriber);
            self.active = true;
            debug!(subscriber = ?self.subscriber.id(), "observer initialized");
        }
        Ok(())
    }

    /// Unsubscribe from the state. Safe to call more than once.
    pub fn dispose(&mut self) {
        if !self.active {
            return;
        }
        if let Some(state) = &self.state {
            state.unsubscribe(&self.subscriber);
        }
        self.active = false;
        debug!(subscriber = ?self.subscriber.id(), "observer disposed");
    }

    /// Whether the observer is currently subscribed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The observed state, if one was supplied.
    pub fn state(&self) -> Option<&R> {
        self.state.as_ref()
    }

    /// The subscriber this observer registers.
    pub fn subscriber(&self) -> &Subscriber {
        &self.subscriber
    }
}

impl<R: Subscribable> Drop for Observer<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

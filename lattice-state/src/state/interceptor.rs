//! Change Interceptor
//!
//! The interceptor sits between the intercepted instance and the raw state
//! value. It only ever sees writes; reads and ordinary method calls on the
//! instance go straight to the state.
//!
//! # Algorithm
//!
//! For a write of `value` through `property`:
//!
//! 1. Resolve the property against the schema, by name and value type.
//!    An unresolved property gets no special handling: the write is applied
//!    and nothing is notified.
//! 2. If the member is not flagged observable, apply the write and stop.
//! 3. Otherwise swap the new value in, compare it with the old one using
//!    `PartialEq`, and run the owning state's notifier iff they differ.
//!
//! The write is never rolled back. The notifier runs after the state borrow
//! is released, so subscribers can read the state they are being told about.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::trace;

use super::property::Property;
use super::schema::{MemberDecl, Schema};
use crate::collections::Listener;

/// What the interceptor did with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Observable member, new value differs: subscribers were notified.
    Changed,
    /// Observable member, new value equals the old one: nobody was notified.
    Unchanged,
    /// Plain or unresolved member: the write was applied without handling.
    PassedThrough,
}

impl WriteOutcome {
    /// Whether subscribers were notified.
    pub fn notified(self) -> bool {
        self == Self::Changed
    }
}

/// Write interceptor for a single state instance.
pub struct ChangeInterceptor<S> {
    schema: Arc<Schema<S>>,
    /// The owning state's notifier.
    notifier: Listener,
}

impl<S> ChangeInterceptor<S> {
    pub(crate) fn new(schema: Arc<Schema<S>>, notifier: Listener) -> Self {
        Self { schema, notifier }
    }

    /// The schema writes are resolved against.
    pub fn schema(&self) -> &Schema<S> {
        &self.schema
    }

    fn resolve<T: 'static>(&self, property: &Property<S, T>) -> Option<&MemberDecl> {
        self.schema
            .member(property.name())
            .filter(|decl| decl.holds::<T>())
    }

    /// Apply a write to `target` and decide whether to notify.
    pub fn write<T>(&self, target: &RefCell<S>, property: &Property<S, T>, value: T) -> WriteOutcome
    where
        T: PartialEq + 'static,
    {
        let observable = match self.resolve(property) {
            Some(decl) => decl.is_observable(),
            None => {
                trace!(
                    type_name = self.schema.type_name(),
                    member = property.name(),
                    "write to unresolved member"
                );
                false
            }
        };

        let outcome = {
            let mut state = target.borrow_mut();
            let slot = property.get_mut(&mut state);
            if observable {
                let old = std::mem::replace(slot, value);
                if old == *slot {
                    WriteOutcome::Unchanged
                } else {
                    WriteOutcome::Changed
                }
            } else {
                *slot = value;
                WriteOutcome::PassedThrough
            }
        };

        trace!(member = property.name(), ?outcome, "intercepted write");
        if outcome.notified() {
            self.notifier.call();
        }
        outcome
    }
}

//! Reactive State
//!
//! [`Reactive<S>`] is the intercepted instance of a state type: the handle
//! application and UI code read and write through. It owns the raw state
//! value, the subscriber registry, and the interceptor, and it wires the
//! state's observable containers into the same notification stream.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Validated -> ProxyCreated -> (subscribe | unsubscribe)* -> Disposed
//! ```
//!
//! - Validation happens once per type, the first time any instance is built
//!   (see [`Schema`]). A failed type never yields an instance.
//! - The raw value is moved into the handle. Clones of a `Reactive` are the
//!   same instance; [`StateSlot`] memoises lazy creation for owners that
//!   want a single instance on demand.
//! - Disposal is dropping the last handle. The state then detaches its
//!   notifier from the containers it holds.
//!
//! # Notification
//!
//! [`Reactive::notify_subscribers`] is the single fan-in point. Writes to
//! observable members reach it through the interceptor; container mutations
//! reach it through the notifier attached during [`Reactive::subscribe`].
//! Subscribers run synchronously, in registration order, on the calling
//! thread, against a snapshot of the registry.
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: the panic propagates out of the write that
//!   triggered it, and later subscribers are skipped for that notification.
//!   The registry itself stays consistent.
//! - **Re-entrant mutation**: a subscriber that writes to the same state
//!   re-enters the notification path recursively. Nothing deduplicates or
//!   bounds this; a subscriber that always writes a new value recurses until
//!   the stack runs out. The current depth is reported in trace output.
//! - **Borrow conflicts**: mutating state from inside [`Reactive::with`] or
//!   [`Reactive::with_mut`] panics, as with any `RefCell`.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::interceptor::{ChangeInterceptor, WriteOutcome};
use super::property::Property;
use super::schema::{MemberKind, Members, Schema};
use super::subscriber::Subscriber;
use crate::collections::{ChangeSignal, Listener};
use crate::error::Result;

/// A state type whose members can be observed.
///
/// Implementors declare their members once; the declaration is validated
/// and cached the first time an instance is constructed.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Counter {
///     count: i32,
///     items: ObservableSequence<String>,
/// }
///
/// impl ReactiveState for Counter {
///     fn declare(members: &mut Members<Self>) {
///         members
///             .property(Property::new("count", |c| &c.count, |c| &mut c.count))
///             .observable();
///         members
///             .sequence(Property::new("items", |c| &c.items, |c| &mut c.items))
///             .observable();
///     }
/// }
///
/// let counter = Reactive::<Counter>::create()?;
/// ```
pub trait ReactiveState: Sized + 'static {
    /// Declare the members of this type.
    fn declare(members: &mut Members<Self>);
}

/// Something a binding can subscribe to.
pub trait Subscribable {
    /// Register `subscriber`. Returns `false` if it was already registered.
    fn subscribe(&self, subscriber: &Subscriber) -> bool;

    /// Remove every registration of `subscriber`. Returns how many were
    /// removed.
    fn unsubscribe(&self, subscriber: &Subscriber) -> usize;
}

struct Inner<S> {
    state: RefCell<S>,
    interceptor: ChangeInterceptor<S>,
    subscribers: RefCell<Vec<Subscriber>>,
    /// Attached to discovered containers. Holds a weak reference back here.
    notifier: Listener,
    depth: Cell<usize>,
}

impl<S> Inner<S> {
    fn notify_subscribers(&self) {
        let snapshot = self.subscribers.borrow().clone();
        let _depth = DepthGuard::enter(&self.depth);

        trace!(
            type_name = self.interceptor.schema().type_name(),
            subscribers = snapshot.len(),
            depth = self.depth.get(),
            "notifying subscribers"
        );

        for subscriber in &snapshot {
            subscriber.notify();
        }
    }
}

impl<S> Drop for Inner<S> {
    fn drop(&mut self) {
        let signals = self
            .interceptor
            .schema()
            .container_signals(self.state.get_mut());
        let unwired = signals
            .iter()
            .filter(|(_, signal)| signal.detach(&self.notifier))
            .count();

        if unwired > 0 {
            debug!(
                type_name = self.interceptor.schema().type_name(),
                unwired,
                "state dropped"
            );
        }
    }
}

/// Tracks notification nesting, unwinding included.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// The intercepted instance of a reactive state.
///
/// Cloning yields another handle to the same instance.
pub struct Reactive<S: ReactiveState> {
    inner: Rc<Inner<S>>,
}

impl<S: ReactiveState> Reactive<S> {
    /// Validate `S` and wrap `state` in an intercepted instance.
    ///
    /// Fails if `S` flags a member observable that cannot be intercepted.
    pub fn new(state: S) -> Result<Self> {
        let schema = Schema::<S>::resolve()?;

        let inner = Rc::new_cyclic(|weak: &Weak<Inner<S>>| {
            let weak = weak.clone();
            let notifier = Listener::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.notify_subscribers();
                }
            });

            Inner {
                state: RefCell::new(state),
                interceptor: ChangeInterceptor::new(schema, notifier.clone()),
                subscribers: RefCell::new(Vec::new()),
                notifier,
                depth: Cell::new(0),
            }
        });

        Ok(Self { inner })
    }

    /// Validate `S` and wrap its default value.
    pub fn create() -> Result<Self>
    where
        S: Default,
    {
        Self::new(S::default())
    }

    /// The validated schema of `S`.
    pub fn schema(&self) -> &Schema<S> {
        self.inner.interceptor.schema()
    }

    /// Check whether two handles are the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Read a member.
    pub fn get<T: Clone>(&self, property: &Property<S, T>) -> T {
        property.get(&self.inner.state.borrow()).clone()
    }

    /// Borrow the state for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Call into the state mutably.
    ///
    /// This is an ordinary method call on the instance: it is not
    /// intercepted and never notifies, even if `f` changes observable
    /// members. Use [`Reactive::set`] for observed writes.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.state.borrow_mut())
    }

    /// Write a member through the interceptor.
    ///
    /// Observable members notify subscribers iff `value` differs from the
    /// current value. The write itself always takes effect.
    ///
    /// Replacing an observable container unwires the old one. The new one is
    /// wired on the next [`Reactive::subscribe`].
    pub fn set<T>(&self, property: &Property<S, T>, value: T) -> WriteOutcome
    where
        T: PartialEq + 'static,
    {
        let previous = self.container_signal(property);
        let outcome = self
            .inner
            .interceptor
            .write(&self.inner.state, property, value);

        if let Some(previous) = previous {
            let kept = self
                .container_signal(property)
                .is_some_and(|current| current.ptr_eq(&previous));
            if !kept && previous.detach(&self.inner.notifier) {
                debug!(
                    type_name = self.schema().type_name(),
                    member = property.name(),
                    "unwired replaced container"
                );
            }
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Subscription registry
    // ------------------------------------------------------------------

    /// Register `subscriber` and wire the state's observable containers.
    ///
    /// Registering the same subscriber again is a no-op and returns `false`.
    /// Containers are rediscovered on every call, so a container replaced
    /// since the last call is picked up here.
    pub fn subscribe(&self, subscriber: &Subscriber) -> bool {
        let added = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            if subscribers.contains(subscriber) {
                false
            } else {
                subscribers.push(subscriber.clone());
                true
            }
        };

        let wired = self
            .discover()
            .into_iter()
            .filter(|(_, signal)| signal.attach(self.inner.notifier.clone()))
            .count();

        debug!(
            type_name = self.schema().type_name(),
            subscriber = ?subscriber.id(),
            added,
            wired,
            "subscribe"
        );
        added
    }

    /// Remove every registration of `subscriber` and unwire the state's
    /// observable containers.
    ///
    /// Containers are unwired even if other subscribers remain; the next
    /// [`Reactive::subscribe`] wires them again.
    pub fn unsubscribe(&self, subscriber: &Subscriber) -> usize {
        let removed = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            let before = subscribers.len();
            subscribers.retain(|registered| registered != subscriber);
            before - subscribers.len()
        };

        let unwired = self
            .discover()
            .into_iter()
            .filter(|(_, signal)| signal.detach(&self.inner.notifier))
            .count();

        debug!(
            type_name = self.schema().type_name(),
            subscriber = ?subscriber.id(),
            removed,
            unwired,
            "unsubscribe"
        );
        removed
    }

    /// Invoke every subscriber, in registration order.
    pub fn notify_subscribers(&self) {
        self.inner.notify_subscribers();
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether `subscriber` is registered.
    pub fn is_subscribed(&self, subscriber: &Subscriber) -> bool {
        self.inner.subscribers.borrow().contains(subscriber)
    }

    /// Names of the observable containers currently wired to this state.
    pub fn wired_containers(&self) -> Vec<&'static str> {
        self.discover()
            .into_iter()
            .filter(|(_, signal)| signal.is_attached(&self.inner.notifier))
            .map(|(name, _)| name)
            .collect()
    }

    /// Signal of the observable container `property` points at, if any.
    fn container_signal<T: 'static>(&self, property: &Property<S, T>) -> Option<ChangeSignal> {
        let decl = self.schema().member(property.name())?;
        if decl.kind() == MemberKind::Value || !decl.holds::<T>() {
            return None;
        }
        self.discover()
            .into_iter()
            .find(|(name, _)| *name == property.name())
            .map(|(_, signal)| signal)
    }

    /// Observable container members on the current state value.
    ///
    /// The borrow is released before any listener is attached or detached.
    fn discover(&self) -> Vec<(&'static str, ChangeSignal)> {
        let state = self.inner.state.borrow();
        self.schema().container_signals(&state)
    }
}

impl<S: ReactiveState> Subscribable for Reactive<S> {
    fn subscribe(&self, subscriber: &Subscriber) -> bool {
        Reactive::subscribe(self, subscriber)
    }

    fn unsubscribe(&self, subscriber: &Subscriber) -> usize {
        Reactive::unsubscribe(self, subscriber)
    }
}

impl<S: ReactiveState> Clone for Reactive<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: ReactiveState + fmt::Debug> fmt::Debug for Reactive<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("state", &*self.inner.state.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Lazy slot
// ----------------------------------------------------------------------------

/// A lazily created, memoised reactive instance.
///
/// The first successful [`StateSlot::get_or_create`] builds the instance;
/// every later call returns a handle to that same instance.
pub struct StateSlot<S: ReactiveState> {
    init: Box<dyn Fn() -> S>,
    instance: OnceCell<Reactive<S>>,
}

impl<S: ReactiveState> StateSlot<S> {
    /// Create a slot that builds its state with `init`.
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> S + 'static,
    {
        Self {
            init: Box::new(init),
            instance: OnceCell::new(),
        }
    }

    /// The instance, creating it on first use.
    pub fn get_or_create(&self) -> Result<Reactive<S>> {
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }
        let created = Reactive::new((self.init)())?;
        Ok(self.instance.get_or_init(|| created).clone())
    }

    /// The instance, if it has been created.
    pub fn get(&self) -> Option<Reactive<S>> {
        self.instance.get().cloned()
    }

    /// Whether the instance has been created.
    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl<S: ReactiveState + Default> Default for StateSlot<S> {
    fn default() -> Self {
        Self::new(S::default)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

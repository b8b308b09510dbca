//! Member Schema
//!
//! Every reactive state type describes its members once, in
//! [`ReactiveState::declare`](super::ReactiveState::declare). The resulting
//! [`Schema`] is consulted at two points:
//!
//! 1. Validation, when the first instance of the type is constructed: every
//!    member flagged observable must be overridable, meaning it was declared
//!    with a write accessor the interceptor can route through.
//!
//! 2. At runtime, by the interceptor (is this member observable?) and by the
//!    subscription registry (which container members should be wired?).
//!
//! # Caching
//!
//! Schemas are built and validated once per type and cached process-wide,
//! keyed by `TypeId`. A type that fails validation stays failed: later
//! constructions return the cached error without calling `declare` again.
//!
//! The cache is the only shared structure in the crate. It is only touched
//! during construction, never on the notification path.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::property::Property;
use super::ReactiveState;
use crate::collections::{ChangeSignal, ObservableMap, ObservableSequence};
use crate::error::{Result, StateError};

/// What kind of value a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A plain value.
    Value,
    /// An [`ObservableSequence`].
    Sequence,
    /// An [`ObservableMap`].
    Map,
}

/// Declaration of a single member.
#[derive(Debug, Clone)]
pub struct MemberDecl {
    name: &'static str,
    kind: MemberKind,
    value_type: TypeId,
    value_type_name: &'static str,
    observable: bool,
    overridable: bool,
}

impl MemberDecl {
    fn new<T: 'static>(name: &'static str, kind: MemberKind, overridable: bool) -> Self {
        Self {
            name,
            kind,
            value_type: TypeId::of::<T>(),
            value_type_name: std::any::type_name::<T>(),
            observable: false,
            overridable,
        }
    }

    /// Flag this member as observable.
    pub fn observable(&mut self) -> &mut Self {
        self.observable = true;
        self
    }

    /// The member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The member kind.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Whether writes to this member notify subscribers.
    pub fn is_observable(&self) -> bool {
        self.observable
    }

    /// Whether writes to this member can be routed through the interceptor.
    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    /// Type name of the member's value.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Whether the member holds a value of type `T`.
    pub fn holds<T: 'static>(&self) -> bool {
        self.value_type == TypeId::of::<T>()
    }
}

type SignalAccessor<S> = Box<dyn Fn(&S) -> ChangeSignal + Send + Sync>;

struct MemberEntry<S> {
    decl: MemberDecl,
    /// Present for container members only.
    signal: Option<SignalAccessor<S>>,
}

/// Builder handed to [`ReactiveState::declare`](super::ReactiveState::declare).
///
/// Each method records one member and returns its declaration so it can be
/// flagged observable:
///
/// ```rust,ignore
/// fn declare(members: &mut Members<Self>) {
///     members.property(Self::count()).observable();
///     members.property(Self::label());
///     members.sequence(Self::items()).observable();
/// }
/// ```
pub struct Members<S> {
    entries: Vec<MemberEntry<S>>,
}

impl<S: 'static> Members<S> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: MemberEntry<S>) -> &mut MemberDecl {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        &mut self.entries[last].decl
    }

    /// Declare a value member with read and write accessors.
    pub fn property<T: 'static>(&mut self, property: Property<S, T>) -> &mut MemberDecl {
        self.push(MemberEntry {
            decl: MemberDecl::new::<T>(property.name(), MemberKind::Value, true),
            signal: None,
        })
    }

    /// Declare a member that has no write accessor.
    ///
    /// Such a member cannot be intercepted, so flagging it observable makes
    /// the type fail validation.
    pub fn readonly<T: 'static>(&mut self, name: &'static str) -> &mut MemberDecl {
        self.push(MemberEntry {
            decl: MemberDecl::new::<T>(name, MemberKind::Value, false),
            signal: None,
        })
    }

    /// Declare an [`ObservableSequence`] member.
    ///
    /// When flagged observable, the sequence is wired into the state's
    /// notifications on every subscribe.
    pub fn sequence<T: 'static>(
        &mut self,
        property: Property<S, ObservableSequence<T>>,
    ) -> &mut MemberDecl {
        self.push(MemberEntry {
            decl: MemberDecl::new::<ObservableSequence<T>>(
                property.name(),
                MemberKind::Sequence,
                true,
            ),
            signal: Some(Box::new(move |state: &S| property.get(state).signal())),
        })
    }

    /// Declare an [`ObservableMap`] member.
    ///
    /// When flagged observable, the map is wired into the state's
    /// notifications on every subscribe.
    pub fn map<K: 'static, V: 'static>(
        &mut self,
        property: Property<S, ObservableMap<K, V>>,
    ) -> &mut MemberDecl {
        self.push(MemberEntry {
            decl: MemberDecl::new::<ObservableMap<K, V>>(property.name(), MemberKind::Map, true),
            signal: Some(Box::new(move |state: &S| property.get(state).signal())),
        })
    }
}

/// The validated member list of a state type.
pub struct Schema<S> {
    type_name: &'static str,
    entries: Vec<MemberEntry<S>>,
}

impl<S: ReactiveState> Schema<S> {
    /// Fetch the schema for `S`, building and validating it on first use.
    pub(crate) fn resolve() -> Result<Arc<Self>> {
        let key = TypeId::of::<S>();

        if let Some(cached) = registry().read().get(&key).and_then(downcast::<S>) {
            return cached;
        }

        // Built outside the lock: `declare` is user code.
        let built = Self::build().map(Arc::new);

        let mut registry = registry().write();
        if let Some(cached) = registry.get(&key).and_then(downcast::<S>) {
            return cached;
        }
        registry.insert(key, Arc::new(built.clone()));
        built
    }

    fn build() -> Result<Self> {
        let mut members = Members::new();
        S::declare(&mut members);

        let schema = Self {
            type_name: std::any::type_name::<S>(),
            entries: members.entries,
        };
        schema.validate()?;

        debug!(
            type_name = schema.type_name,
            members = schema.entries.len(),
            "registered state schema"
        );
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            let name = entry.decl.name;

            if self.entries[..index].iter().any(|e| e.decl.name == name) {
                warn!(type_name = self.type_name, member = name, "duplicate member");
                return Err(StateError::DuplicateMember {
                    member: name,
                    type_name: self.type_name,
                });
            }

            if entry.decl.observable && !entry.decl.overridable {
                warn!(
                    type_name = self.type_name,
                    member = name,
                    "observable member is not overridable"
                );
                return Err(StateError::NotOverridable {
                    member: name,
                    type_name: self.type_name,
                });
            }
        }
        Ok(())
    }
}

impl<S> Schema<S> {
    /// Name of the state type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDecl> {
        self.entries
            .iter()
            .map(|entry| &entry.decl)
            .find(|decl| decl.name == name)
    }

    /// All declared members, in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &MemberDecl> {
        self.entries.iter().map(|entry| &entry.decl)
    }

    /// Signals of every observable container member on `state`.
    ///
    /// Re-read on each call so that replaced containers are picked up.
    pub(crate) fn container_signals(&self, state: &S) -> Vec<(&'static str, ChangeSignal)> {
        self.entries
            .iter()
            .filter(|entry| entry.decl.observable)
            .filter_map(|entry| {
                let accessor = entry.signal.as_ref()?;
                Some((entry.decl.name, accessor(state)))
            })
            .collect()
    }
}

impl<S> fmt::Debug for Schema<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("members", &self.members().collect::<Vec<_>>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Registry
// ----------------------------------------------------------------------------

/// Cached outcome of building a schema. Stored type-erased in the registry.
type Resolved<S> = Result<Arc<Schema<S>>>;

static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn downcast<S: ReactiveState>(entry: &Arc<dyn Any + Send + Sync>) -> Option<Resolved<S>> {
    entry.downcast_ref::<Resolved<S>>().cloned()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Profile {
        name: String,
        visits: u32,
        tags: ObservableSequence<String>,
        scores: ObservableMap<String, u32>,
    }

    impl Profile {
        fn name() -> Property<Self, String> {
            Property::new("name", |p| &p.name, |p| &mut p.name)
        }

        fn visits() -> Property<Self, u32> {
            Property::new("visits", |p| &p.visits, |p| &mut p.visits)
        }

        fn tags() -> Property<Self, ObservableSequence<String>> {
            Property::new("tags", |p| &p.tags, |p| &mut p.tags)
        }

        fn scores() -> Property<Self, ObservableMap<String, u32>> {
            Property::new("scores", |p| &p.scores, |p| &mut p.scores)
        }
    }

    impl ReactiveState for Profile {
        fn declare(members: &mut Members<Self>) {
            members.property(Self::name()).observable();
            members.property(Self::visits());
            members.sequence(Self::tags()).observable();
            members.map(Self::scores());
        }
    }

    struct Sealed;

    impl ReactiveState for Sealed {
        fn declare(members: &mut Members<Self>) {
            members.readonly::<u64>("checksum").observable();
        }
    }

    struct Twice {
        a: u8,
    }

    impl ReactiveState for Twice {
        fn declare(members: &mut Members<Self>) {
            members.property(Property::new("a", |t: &Twice| &t.a, |t| &mut t.a));
            members.property(Property::new("a", |t: &Twice| &t.a, |t| &mut t.a));
        }
    }

    #[test]
    fn schema_records_declared_members() {
        let schema = Schema::<Profile>::resolve().expect("valid schema");

        let names: Vec<_> = schema.members().map(MemberDecl::name).collect();
        assert_eq!(names, vec!["name", "visits", "tags", "scores"]);

        let name = schema.member("name").expect("declared");
        assert!(name.is_observable());
        assert!(name.is_overridable());
        assert!(name.holds::<String>());
        assert_eq!(name.kind(), MemberKind::Value);

        assert!(!schema.member("visits").expect("declared").is_observable());
        assert_eq!(schema.member("tags").expect("declared").kind(), MemberKind::Sequence);
        assert!(schema.member("missing").is_none());
    }

    #[test]
    fn schema_is_cached_per_type() {
        let first = Schema::<Profile>::resolve().expect("valid schema");
        let second = Schema::<Profile>::resolve().expect("valid schema");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn only_observable_containers_are_discovered() {
        let schema = Schema::<Profile>::resolve().expect("valid schema");
        let profile = Profile::default();

        let discovered = schema.container_signals(&profile);
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].0, "tags");
        assert!(discovered[0].1.ptr_eq(&profile.tags.signal()));
    }

    #[test]
    fn observable_readonly_member_fails_validation() {
        let err = Schema::<Sealed>::resolve().expect_err("sealed member");
        assert_eq!(
            err,
            StateError::NotOverridable {
                member: "checksum",
                type_name: std::any::type_name::<Sealed>(),
            }
        );

        // Failure is cached and terminal for the type.
        assert_eq!(Schema::<Sealed>::resolve().expect_err("still sealed"), err);
    }

    #[test]
    fn duplicate_member_fails_validation() {
        let err = Schema::<Twice>::resolve().expect_err("duplicate");
        assert!(matches!(err, StateError::DuplicateMember { member: "a", .. }));
    }
}

//! Error types for the state layer.
//!
//! Every variant here is a programmer error: it is raised synchronously at
//! the point of violation (type construction or first use of a binding) and
//! is never retried internally. Ordinary no-op outcomes such as removing an
//! absent key are reported through return values instead.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised by the state layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A member is flagged observable but has no write accessor, so writes
    /// to it can never be routed through the interceptor.
    #[error(
        "member `{member}` of `{type_name}` is marked observable but is not overridable; \
         observable members must be declared with a write accessor"
    )]
    NotOverridable {
        member: &'static str,
        type_name: &'static str,
    },

    /// Two members of the same type were declared under one name.
    #[error("member `{member}` is declared more than once on `{type_name}`")]
    DuplicateMember {
        member: &'static str,
        type_name: &'static str,
    },

    /// A binding was initialised without the state it observes.
    #[error("{binding} requires a state instance, but none was supplied")]
    MissingState { binding: &'static str },

    /// `ObservableMap::add` was called with a key that is already present.
    #[error("an entry with the same key already exists")]
    DuplicateKey,
}

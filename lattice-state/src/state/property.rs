//! Property accessors.
//!
//! A `Property<S, T>` is one entry of a state type's setter table: a member
//! name plus a pair of plain function pointers that borrow the member out of
//! `S`. Properties are what [`Reactive::set`](super::Reactive::set) routes
//! through the interceptor, and what a state type hands to
//! [`Members`](super::Members) when it declares itself.
//!
//! ```rust,ignore
//! struct Cart {
//!     total: u32,
//! }
//!
//! impl Cart {
//!     fn total() -> Property<Self, u32> {
//!         Property::new("total", |cart| &cart.total, |cart| &mut cart.total)
//!     }
//! }
//! ```

use std::fmt;

/// Named accessor pair for a member of type `T` on state `S`.
pub struct Property<S, T> {
    name: &'static str,
    get: fn(&S) -> &T,
    get_mut: fn(&mut S) -> &mut T,
}

impl<S, T> Property<S, T> {
    /// Create a property from a name and its accessors.
    ///
    /// The name is how the interceptor resolves the property against the
    /// declared members of `S`.
    pub fn new(name: &'static str, get: fn(&S) -> &T, get_mut: fn(&mut S) -> &mut T) -> Self {
        Self { name, get, get_mut }
    }

    /// The member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the member.
    pub fn get<'a>(&self, state: &'a S) -> &'a T {
        (self.get)(state)
    }

    /// Borrow the member's storage mutably.
    pub fn get_mut<'a>(&self, state: &'a mut S) -> &'a mut T {
        (self.get_mut)(state)
    }
}

impl<S, T> Clone for Property<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Property<S, T> {}

impl<S, T> fmt::Debug for Property<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    fn x() -> Property<Point, i32> {
        Property::new("x", |p| &p.x, |p| &mut p.x)
    }

    #[test]
    fn property_reads_and_writes_its_member() {
        let mut point = Point { x: 1, y: 2 };
        let prop = x();

        assert_eq!(prop.name(), "x");
        assert_eq!(*prop.get(&point), 1);

        *prop.get_mut(&mut point) = 7;
        assert_eq!(point.x, 7);
        assert_eq!(point.y, 2);
    }

    #[test]
    fn property_is_copy() {
        let prop = x();
        let copy = prop;
        assert_eq!(prop.name(), copy.name());
    }
}

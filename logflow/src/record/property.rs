//! Named properties and their role flags.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Additive role flags attached to a property.
///
/// Roles are queried by value, never by type inspection. They are never
/// silently dropped; only explicit delete semantics remove a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PropertyRoles(u8);

impl PropertyRoles {
    /// Ordinary payload data, always kept.
    pub const REGULAR: Self = Self(1);
    /// Dropped at the next stage boundary.
    pub const TRANSIENT: Self = Self(1 << 1);
    /// Pipeline bookkeeping, excluded from sink output.
    pub const META: Self = Self(1 << 2);
    /// Marked for removal by a later sweep.
    pub const OBSOLETE: Self = Self(1 << 3);
    /// Deleted; skipped by iteration.
    pub const DELETED: Self = Self(1 << 4);

    /// The empty role set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns true when no role is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true when every role in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two role sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Adds the given roles in place.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Removes the given roles in place.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for PropertyRoles {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for PropertyRoles {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Null-object property returned for absent names.
static NULL_PROPERTY: Property = Property {
    name: String::new(),
    value: serde_json::Value::Null,
    roles: PropertyRoles::empty(),
};

/// A single named property of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// The property name. Compared case-insensitively by the record.
    pub name: String,
    /// The opaque property value.
    pub value: serde_json::Value,
    /// The roles this property carries.
    pub roles: PropertyRoles,
}

impl Property {
    /// Creates a regular property.
    #[must_use]
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
            roles: PropertyRoles::REGULAR,
        }
    }

    /// Creates a property with an explicit role set.
    #[must_use]
    pub fn with_roles(
        name: impl Into<String>,
        value: serde_json::Value,
        roles: PropertyRoles,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            roles,
        }
    }

    /// Creates a pipeline-bookkeeping property, excluded from sinks.
    #[must_use]
    pub fn meta(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::with_roles(name, value, PropertyRoles::META)
    }

    /// Creates a property dropped at the next stage boundary.
    #[must_use]
    pub fn transient(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::with_roles(name, value, PropertyRoles::TRANSIENT)
    }

    /// Returns the shared null-object property.
    ///
    /// Returned by [`crate::record::Record::get`] for absent names so
    /// callers never null-check; absence is represented, not exceptional.
    #[must_use]
    pub fn null() -> &'static Self {
        &NULL_PROPERTY
    }

    /// Returns true for the null-object property.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.name.is_empty() && self.value.is_null() && self.roles.is_empty()
    }

    /// Returns true when the property carries the given role.
    #[must_use]
    pub fn has_role(&self, role: PropertyRoles) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_are_additive() {
        let mut roles = PropertyRoles::REGULAR;
        roles |= PropertyRoles::META;

        assert!(roles.contains(PropertyRoles::REGULAR));
        assert!(roles.contains(PropertyRoles::META));
        assert!(!roles.contains(PropertyRoles::DELETED));
    }

    #[test]
    fn test_roles_union_and_remove() {
        let both = PropertyRoles::TRANSIENT.union(PropertyRoles::OBSOLETE);
        assert!(both.contains(PropertyRoles::TRANSIENT));

        let mut roles = both;
        roles.remove(PropertyRoles::TRANSIENT);
        assert!(!roles.contains(PropertyRoles::TRANSIENT));
        assert!(roles.contains(PropertyRoles::OBSOLETE));
    }

    #[test]
    fn test_property_constructors() {
        let p = Property::new("user", json!("alice"));
        assert!(p.has_role(PropertyRoles::REGULAR));

        let m = Property::meta("logger", json!("app"));
        assert!(m.has_role(PropertyRoles::META));
        assert!(!m.has_role(PropertyRoles::REGULAR));
    }

    #[test]
    fn test_null_property() {
        let null = Property::null();
        assert!(null.is_null());
        assert!(!Property::new("x", json!(1)).is_null());
    }
}

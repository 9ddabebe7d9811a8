//! The mutable, named-property record flowing through a pipeline.

mod property;
mod view;

pub use property::{Property, PropertyRoles};
pub use view::RecordView;

use crate::level::Level;
use chrono::Utc;
use serde_json::Value;

/// Name of the timestamp property stamped on every new record.
pub const TIMESTAMP_PROPERTY: &str = "timestamp";

/// A single log event: an insertion-ordered, case-insensitive mapping
/// from property name to [`Property`].
///
/// Pushing a property whose name already exists overwrites the value in
/// place, keeping the entry's position and unioning the previous role
/// flags into the new ones. No operation fails for a missing key.
#[derive(Debug, Clone)]
pub struct Record {
    level: Level,
    properties: Vec<Property>,
}

impl Record {
    /// Creates a record at the given level, stamped with the current
    /// wall-clock time as a meta property.
    #[must_use]
    pub fn new(level: Level) -> Self {
        let mut record = Self {
            level,
            properties: Vec::new(),
        };
        record.push(Property::meta(
            TIMESTAMP_PROPERTY,
            Value::String(Utc::now().to_rfc3339()),
        ));
        record
    }

    /// Returns the record's level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Changes the record's level.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Inserts or overwrites a property.
    ///
    /// An overwrite keeps the entry's position and preserves previously
    /// set role flags by unioning them into the new property's roles.
    pub fn push(&mut self, mut property: Property) {
        match self.position(&property.name) {
            Some(i) => {
                property.roles.insert(self.properties[i].roles);
                // An overwrite revives a deleted entry.
                property.roles.remove(PropertyRoles::DELETED);
                self.properties[i] = property;
            }
            None => self.properties.push(property),
        }
    }

    /// Convenience for pushing a regular property.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.push(Property::new(name, value));
    }

    /// Looks up a live property by case-insensitive name.
    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<&Property> {
        self.position(name)
            .map(|i| &self.properties[i])
            .filter(|p| !p.has_role(PropertyRoles::DELETED))
    }

    /// Looks up a property, returning the null object when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &Property {
        self.try_get(name).unwrap_or_else(|| Property::null())
    }

    /// Returns true when a live property with the name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.try_get(name).is_some()
    }

    /// Iterates live properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties
            .iter()
            .filter(|p| !p.has_role(PropertyRoles::DELETED))
    }

    /// Lazily filters live properties carrying the given role.
    pub fn with_role(&self, role: PropertyRoles) -> impl Iterator<Item = &Property> {
        self.iter().filter(move |p| p.has_role(role))
    }

    /// Applies another record's properties on top of this one.
    ///
    /// Used to stage speculative changes in a scratch record that are
    /// only merged in once a later check passes.
    pub fn merge(&mut self, other: Record) {
        for property in other.properties {
            if !property.has_role(PropertyRoles::DELETED) {
                self.push(property);
            }
        }
    }

    /// Marks a property as deleted. Missing names are a no-op.
    pub fn remove(&mut self, name: &str) {
        if let Some(i) = self.position(name) {
            self.properties[i].roles.insert(PropertyRoles::DELETED);
        }
    }

    /// Renames a property in place, keeping its position.
    ///
    /// An existing live property under the target name is deleted first
    /// so the invariant of one property per name holds.
    pub fn rename(&mut self, from: &str, to: &str) {
        if from.eq_ignore_ascii_case(to) {
            if let Some(i) = self.position(from) {
                self.properties[i].name = to.to_string();
            }
            return;
        }
        let Some(i) = self.position(from) else {
            return;
        };
        if let Some(j) = self.position(to) {
            self.properties[j].roles.insert(PropertyRoles::DELETED);
        }
        self.properties[i].name = to.to_string();
    }

    /// Physically drops deleted and obsolete entries.
    pub fn sweep(&mut self) {
        self.properties.retain(|p| {
            !p.has_role(PropertyRoles::DELETED) && !p.has_role(PropertyRoles::OBSOLETE)
        });
    }

    /// Drops transient properties at a stage boundary.
    pub fn strip_transient(&mut self) {
        self.properties
            .retain(|p| !p.has_role(PropertyRoles::TRANSIENT));
    }

    /// Returns the number of live properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true when no live property exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the read-only sink projection of this record.
    #[must_use]
    pub fn view(&self) -> RecordView {
        RecordView::of(self)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

//! Read-only record projection handed to sinks.

use super::{PropertyRoles, Record};
use crate::level::Level;
use serde::Serialize;
use serde_json::Value;

/// Read-only projection of a finished record.
///
/// Contains only deliverable properties: meta, transient and deleted
/// entries are excluded. Sinks receive this view and cannot mutate
/// pipeline state through it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    level: Level,
    entries: Vec<(String, Value)>,
}

impl RecordView {
    /// Builds the projection of a record.
    #[must_use]
    pub fn of(record: &Record) -> Self {
        let entries = record
            .iter()
            .filter(|p| {
                !p.has_role(PropertyRoles::META) && !p.has_role(PropertyRoles::TRANSIENT)
            })
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        Self {
            level: record.level(),
            entries,
        }
    }

    /// Returns the record's level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Looks up a value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Iterates name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the property names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Returns the number of deliverable properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is deliverable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the view as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "level".to_string(),
            Value::String(self.level.as_str().to_string()),
        );
        for (name, value) in &self.entries {
            map.insert(name.clone(), value.clone());
        }
        Value::Object(map)
    }
}

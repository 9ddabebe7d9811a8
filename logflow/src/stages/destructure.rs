//! Flattening and serialization of structured property values.

use crate::pipeline::{ranks, Next, Stage};
use crate::record::Record;
use crate::serialize::Serializer;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Nesting depth past which a value graph is treated as unsupported.
const MAX_DEPTH: usize = 16;

/// Converts non-primitive property values into a flat dictionary and
/// then into a serialized string, replacing the original value.
///
/// Unsupported graphs (excessive nesting, serializer failures) degrade
/// to a type-name placeholder; this stage never fails the pipeline.
#[derive(Debug, Clone)]
pub struct DestructureStage {
    serializer: Arc<dyn Serializer>,
}

impl DestructureStage {
    /// Creates a stage using the given serializer.
    #[must_use]
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self { serializer }
    }

    fn flatten_into(prefix: &str, value: &Value, depth: usize, out: &mut Map<String, Value>) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }
        match value {
            Value::Object(map) => {
                for (key, inner) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    if !Self::flatten_into(&path, inner, depth + 1, out) {
                        return false;
                    }
                }
                true
            }
            Value::Array(items) => {
                for (i, inner) in items.iter().enumerate() {
                    let path = format!("{prefix}[{i}]");
                    if !Self::flatten_into(&path, inner, depth + 1, out) {
                        return false;
                    }
                }
                true
            }
            primitive => {
                out.insert(prefix.to_string(), primitive.clone());
                true
            }
        }
    }

    fn destructure(&self, name: &str, value: &Value) -> Value {
        let placeholder = || Value::String(format!("<{}>", type_name(value)));

        let mut flat = Map::new();
        if !Self::flatten_into(name, value, 0, &mut flat) {
            return placeholder();
        }
        match self.serializer.serialize(&Value::Object(flat)) {
            Ok(rendered) => Value::String(rendered),
            Err(err) => {
                tracing::debug!(error = %err, "destructure fell back to placeholder");
                placeholder()
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Stage for DestructureStage {
    fn name(&self) -> &str {
        "destructure"
    }

    fn rank(&self) -> i32 {
        ranks::DESTRUCTURE
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        let structured: Vec<String> = record
            .iter()
            .filter(|p| p.value.is_object() || p.value.is_array())
            .map(|p| p.name.clone())
            .collect();

        for name in structured {
            let mut property = record.get(&name).clone();
            property.value = self.destructure(&name, &property.value);
            record.push(property);
        }

        next.invoke(record);
    }
}

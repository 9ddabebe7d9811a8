//! Injectable serializer boundary.

use crate::errors::SerializeError;
use serde_json::Value;
use std::fmt::Debug;

/// Converts opaque property values into strings.
///
/// Failures must degrade at the destructure stage; they never propagate
/// through the pipeline.
pub trait Serializer: Send + Sync + Debug {
    /// Serializes a value to its string form.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] when the value cannot be rendered.
    fn serialize(&self, value: &Value) -> Result<String, SerializeError>;
}

/// Default serializer producing compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String, SerializeError> {
        serde_json::to_string(value).map_err(|e| SerializeError::new(e.to_string()))
    }
}

//! Correlation stamping for scoped records.

use crate::errors::ScopeMisuseError;
use crate::pipeline::{ranks, Next, Stage};
use crate::record::{Property, Record};
use serde_json::Value;

/// Name of the correlation id property.
pub const CORRELATION_ID_PROPERTY: &str = "correlation_id";
/// Name of the caller-supplied correlation handle property.
pub const CORRELATION_HANDLE_PROPERTY: &str = "correlation_handle";
/// Name of the ancestor correlation chain property.
pub const CORRELATION_CHAIN_PROPERTY: &str = "correlation_chain";

/// Stamps the current scope's correlation id and handle on each record.
///
/// The id is generated once per scope and memoized there. In a nested
/// scope the ancestor chain is stamped too, closest parent first, by
/// walking the scope's parent links. Invoking this stage without an
/// open scope is a programmer error: loud in debug builds, a pass-through
/// in release.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationStage;

impl CorrelationStage {
    /// Creates a new correlation stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Stage for CorrelationStage {
    fn name(&self) -> &str {
        "correlation"
    }

    fn rank(&self) -> i32 {
        ranks::CORRELATION
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        let Some(scope) = next.scope() else {
            let err = ScopeMisuseError::new(
                "(none)",
                "correlation stage invoked without an open scope",
            );
            tracing::error!(error = %err, "scope misuse");
            debug_assert!(false, "{err}");
            next.invoke(record);
            return;
        };

        record.push(Property::new(
            CORRELATION_ID_PROPERTY,
            Value::String(scope.correlation_id().to_string()),
        ));
        if let Some(handle) = scope.correlation_handle() {
            record.push(Property::new(
                CORRELATION_HANDLE_PROPERTY,
                Value::String(handle.to_string()),
            ));
        }

        let chain: Vec<Value> = scope
            .ancestors()
            .map(|a| Value::String(a.correlation_id().to_string()))
            .collect();
        if !chain.is_empty() {
            record.push(Property::new(
                CORRELATION_CHAIN_PROPERTY,
                Value::Array(chain),
            ));
        }

        next.invoke(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use std::sync::Arc;

    #[test]
    #[should_panic(expected = "correlation stage invoked without an open scope")]
    fn test_without_scope_is_loud_in_debug() {
        let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(CorrelationStage::new())];
        let mut record = Record::new(Level::Info);
        Next::new(&stages, None).invoke(&mut record);
    }
}

//! The scope controller stage.

use crate::pipeline::CONTROLLER_STAGE;
use crate::pipeline::{ranks, Next, Stage};
use crate::record::{Property, Record};
use serde_json::Value;

/// Name of the meta property identifying the current scope.
pub const SCOPE_PROPERTY: &str = "scope";
/// Name of the meta property carrying the current scope's correlation id.
pub const SCOPE_CORRELATION_PROPERTY: &str = "scope_correlation";

/// Detours records into the current scope's private branch.
///
/// Sits directly after the head of every chain. With no scope open it
/// is a pass-through; with a scope current it stamps meta properties
/// identifying the scope and redirects the cursor to the branch head.
/// The branch rejoins the main chain when its stages are exhausted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeControllerStage;

impl ScopeControllerStage {
    /// Creates a new scope controller.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Stage for ScopeControllerStage {
    fn name(&self) -> &str {
        CONTROLLER_STAGE
    }

    fn rank(&self) -> i32 {
        ranks::CONTROLLER
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        let Some(scope) = next.scope() else {
            next.invoke(record);
            return;
        };
        if scope.is_disposed() {
            tracing::error!(scope = %scope.name(), "log call reached a disposed scope");
            next.invoke(record);
            return;
        }

        record.push(Property::meta(
            SCOPE_PROPERTY,
            Value::String(scope.name().to_string()),
        ));
        record.push(Property::meta(
            SCOPE_CORRELATION_PROPERTY,
            Value::String(scope.correlation_id().to_string()),
        ));

        next.detour(scope.branch_stages()).invoke(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextStack;
    use crate::level::Level;
    use crate::pipeline::ScopeStageConfig;
    use crate::pipeline::NoOpStage;
    use crate::scope::{Caller, Scope, ScopeStack};
    use crate::stages::CORRELATION_ID_PROPERTY;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn stack() -> ScopeStack {
        Arc::new(Mutex::new(ContextStack::new()))
    }

    #[test]
    fn test_pass_through_without_scope() {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(ScopeControllerStage::new()),
            Arc::new(NoOpStage::new("after")),
        ];

        let mut record = Record::new(Level::Info);
        Next::new(&stages, None).invoke(&mut record);

        assert!(!record.contains(SCOPE_PROPERTY));
    }

    #[test]
    fn test_detours_into_branch_and_rejoins() {
        let stack = stack();
        let scope = Scope::open(
            "job",
            "test",
            None,
            Caller::here(),
            &[ScopeStageConfig::Correlation],
            Vec::new(),
            stack.clone(),
            None,
        );

        let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(ScopeControllerStage::new())];
        let mut record = Record::new(Level::Info);
        Next::new(&stages, Some(scope.data())).invoke(&mut record);

        assert_eq!(
            record.get(SCOPE_PROPERTY).value.as_str(),
            Some("job")
        );
        // The branch's correlation stage ran.
        assert_eq!(
            record.get(CORRELATION_ID_PROPERTY).value.as_str(),
            Some(scope.correlation_id())
        );

        scope.dispose();
    }
}

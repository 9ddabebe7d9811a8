//! Head stage stamping the owning logger's name.

use crate::pipeline::{ranks, Next, Stage};
use crate::record::{Property, Record};
use serde_json::Value;
use std::sync::Arc;

/// Name of the meta property carrying the logger name.
pub const LOGGER_PROPERTY: &str = "logger";

/// First stage of every chain: stamps the logger's name as a meta
/// property so later stages and hooks can attribute the record.
#[derive(Debug, Clone)]
pub struct LoggerNameStage {
    logger: Arc<str>,
}

impl LoggerNameStage {
    /// Creates the head stage for a logger.
    #[must_use]
    pub fn new(logger: impl Into<Arc<str>>) -> Self {
        Self {
            logger: logger.into(),
        }
    }
}

impl Stage for LoggerNameStage {
    fn name(&self) -> &str {
        "logger_name"
    }

    fn rank(&self) -> i32 {
        ranks::HEAD
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        record.push(Property::meta(
            LOGGER_PROPERTY,
            Value::String(self.logger.to_string()),
        ));
        next.invoke(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::record::PropertyRoles;
    use serde_json::json;

    #[test]
    fn test_stamps_logger_name() {
        let stage = LoggerNameStage::new("orders");
        let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(stage)];

        let mut record = Record::new(Level::Info);
        Next::new(&stages, None).invoke(&mut record);

        let prop = record.get(LOGGER_PROPERTY);
        assert_eq!(prop.value, json!("orders"));
        assert!(prop.has_role(PropertyRoles::META));
    }
}

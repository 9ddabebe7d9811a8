//! Predicate-based record filtering.

use crate::level::Level;
use crate::pipeline::{ranks, Next, Stage};
use crate::record::Record;
use std::fmt;

type Predicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Forwards a record only when its predicate holds; otherwise the
/// record is dropped and the invocation returns without reaching any
/// later stage.
pub struct FilterStage {
    label: String,
    predicate: Predicate,
}

impl FilterStage {
    /// Creates a filter from an arbitrary predicate.
    #[must_use]
    pub fn new(label: impl Into<String>, predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Creates a filter passing records at or above a level.
    #[must_use]
    pub fn min_level(level: Level) -> Self {
        Self::new(format!("min_level({level})"), move |record| {
            record.level() >= level
        })
    }
}

impl fmt::Debug for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStage")
            .field("label", &self.label)
            .finish()
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &str {
        "filter"
    }

    fn rank(&self) -> i32 {
        ranks::FILTER
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        if (self.predicate)(record) {
            next.invoke(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct CountingStage {
        hits: AtomicUsize,
    }

    impl Stage for CountingStage {
        fn name(&self) -> &str {
            "counting"
        }

        fn invoke(&self, record: &mut Record, next: Next<'_>) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            next.invoke(record);
        }
    }

    #[test]
    fn test_min_level_filter() {
        let counter = Arc::new(CountingStage {
            hits: AtomicUsize::new(0),
        });
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(FilterStage::min_level(Level::Warning)),
            counter.clone(),
        ];

        let mut info = Record::new(Level::Info);
        Next::new(&stages, None).invoke(&mut info);

        let mut error = Record::new(Level::Error);
        Next::new(&stages, None).invoke(&mut error);

        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_predicate() {
        let counter = Arc::new(CountingStage {
            hits: AtomicUsize::new(0),
        });
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(FilterStage::new("has_user", |r| r.contains("user"))),
            counter.clone(),
        ];

        let mut anonymous = Record::new(Level::Info);
        Next::new(&stages, None).invoke(&mut anonymous);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 0);

        let mut named = Record::new(Level::Info);
        named.set("user", json!("alice"));
        Next::new(&stages, None).invoke(&mut named);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }
}

//! Sink trait and implementations.

use crate::errors::SinkError;
use crate::level::Level;
use crate::record::RecordView;
use std::fmt::Debug;
use tracing::{debug, error, info, trace, warn};

/// Receives finished records from the terminal echo stage.
///
/// A sink gets a read-only projection and cannot mutate pipeline state.
/// Any error it returns is caught at the echo stage and does not block
/// delivery to other sinks.
pub trait Sink: Send + Sync + Debug {
    /// Returns the sink's name, used in fallback diagnostics.
    fn name(&self) -> &str;

    /// Delivers one record view.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails; the echo stage logs
    /// and suppresses it.
    fn log(&self, view: &RecordView) -> Result<(), SinkError>;
}

/// A sink that discards all records.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl Sink for NoOpSink {
    fn name(&self) -> &str {
        "noop"
    }

    fn log(&self, _view: &RecordView) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that forwards records to the `tracing` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn log(&self, view: &RecordView) -> Result<(), SinkError> {
        let rendered = view.to_json().to_string();
        match view.level() {
            Level::Trace => trace!(record = %rendered, "log record"),
            Level::Debug => debug!(record = %rendered, "log record"),
            Level::Info => info!(record = %rendered, "log record"),
            Level::Warning => warn!(record = %rendered, "log record"),
            Level::Error | Level::Critical => error!(record = %rendered, "log record"),
        }
        Ok(())
    }
}

/// A collecting sink for assertions in tests and diagnostics dumps.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: parking_lot::RwLock<Vec<RecordView>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected record views.
    #[must_use]
    pub fn records(&self) -> Vec<RecordView> {
        self.records.read().clone()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all collected records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl Sink for CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }

    fn log(&self, view: &RecordView) -> Result<(), SinkError> {
        self.records.write().push(view.clone());
        Ok(())
    }
}

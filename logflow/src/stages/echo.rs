//! Terminal fan-out to external sinks.

use crate::pipeline::{ranks, Next, Stage};
use crate::record::Record;
use crate::sinks::Sink;
use std::sync::Arc;

/// The terminal stage: fans the finished record out, read-only, to
/// every registered sink.
///
/// A sink failure is caught per sink, reported on the `tracing`
/// fallback channel, and never prevents delivery to the remaining
/// sinks or escapes to the caller. The echo stage does not forward.
#[derive(Debug, Clone)]
pub struct EchoStage {
    sinks: Vec<Arc<dyn Sink>>,
}

impl EchoStage {
    /// Creates the terminal stage over the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Returns the number of registered sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Stage for EchoStage {
    fn name(&self) -> &str {
        "echo"
    }

    fn rank(&self) -> i32 {
        ranks::TERMINAL
    }

    fn invoke(&self, record: &mut Record, _next: Next<'_>) {
        let view = record.view();
        for sink in &self.sinks {
            if let Err(err) = sink.log(&view) {
                tracing::warn!(sink = sink.name(), error = %err, "sink delivery failed");
            }
        }
    }
}

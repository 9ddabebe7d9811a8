//! Record buffering with high-priority bypass.

use crate::level::Level;
use crate::pipeline::{ranks, Next, Stage};
use crate::record::Record;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Buffers records in an unbounded FIFO instead of forwarding them.
///
/// Records at or above the bypass level skip the buffer and forward
/// immediately. Order is preserved within buffered records and within
/// bypassed records separately; there is no global order across the two
/// categories, and an interleaving is flagged at flush time rather than
/// silently reordered.
///
/// Opt-in: a new stage starts disabled and is switched on explicitly
/// (listing it in a scope configuration does so); switching it off
/// again makes it behaviorally absent. Draining is driven by the owning
/// scope, which knows the continuation the buffered records must rejoin.
#[derive(Debug)]
pub struct BufferStage {
    queue: Mutex<VecDeque<Record>>,
    bypass_level: Level,
    active: AtomicBool,
    interleaved: AtomicBool,
}

impl BufferStage {
    /// Creates a buffer stage. Disabled until [`set_active`] opts it in;
    /// a disabled buffer is behaviorally absent from the chain.
    ///
    /// [`set_active`]: BufferStage::set_active
    #[must_use]
    pub fn new(bypass_level: Level) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            bypass_level,
            active: AtomicBool::new(false),
            interleaved: AtomicBool::new(false),
        }
    }

    /// Switches buffering on or off.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Returns the number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Takes all buffered records, oldest first.
    pub(crate) fn drain(&self) -> Vec<Record> {
        if self.interleaved.swap(false, Ordering::SeqCst) {
            tracing::debug!(
                "high-priority records bypassed the buffer while it was non-empty; \
                 order across categories is not guaranteed"
            );
        }
        self.queue.lock().drain(..).collect()
    }

    /// Discards all buffered records, returning how many were dropped.
    pub fn clear(&self) -> usize {
        self.interleaved.store(false, Ordering::SeqCst);
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }
}

impl Stage for BufferStage {
    fn name(&self) -> &str {
        "buffer"
    }

    fn rank(&self) -> i32 {
        ranks::BUFFER
    }

    fn enabled(&self, _record: &Record) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        if record.level() >= self.bypass_level {
            if !self.is_empty() {
                self.interleaved.store(true, Ordering::SeqCst);
            }
            next.invoke(record);
            return;
        }
        self.queue.lock().push_back(record.clone());
        // Deferred; the scope forwards buffered records on flush.
    }

    fn shutdown(&self) {
        let dropped = self.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "buffer discarded unflushed records at teardown");
        }
    }
}

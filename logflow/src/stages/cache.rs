//! Bounded in-memory record cache.

use crate::pipeline::{ranks, Next, Stage};
use crate::record::Record;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keeps the last N records in a fixed-capacity FIFO for later
/// inspection, e.g. a diagnostics dump at scope end.
///
/// Purely observational: the record is always forwarded regardless of
/// caching, and the oldest entry is evicted when the ring is full.
/// Opt-in, like the buffer stage: a new cache starts disabled.
#[derive(Debug)]
pub struct BoundedCacheStage {
    ring: Mutex<VecDeque<Record>>,
    capacity: usize,
    active: AtomicBool,
}

impl BoundedCacheStage {
    /// Creates a cache holding at most `capacity` records. Disabled
    /// until [`set_active`] opts it in.
    ///
    /// [`set_active`]: BoundedCacheStage::set_active
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            active: AtomicBool::new(false),
        }
    }

    /// Switches caching on or off.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Returns the cached records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Record> {
        self.ring.lock().iter().cloned().collect()
    }

    /// Returns the number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }
}

impl Stage for BoundedCacheStage {
    fn name(&self) -> &str {
        "bounded_cache"
    }

    fn rank(&self) -> i32 {
        ranks::CACHE
    }

    fn enabled(&self, _record: &Record) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        {
            let mut ring = self.ring.lock();
            if ring.len() == self.capacity {
                ring.pop_front();
            }
            ring.push_back(record.clone());
        }
        next.invoke(record);
    }

    fn shutdown(&self) {
        self.ring.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use serde_json::json;
    use std::sync::Arc;

    fn numbered(n: u64) -> Record {
        let mut r = Record::new(Level::Info);
        r.set("n", json!(n));
        r
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let cache = Arc::new(BoundedCacheStage::new(3));
        cache.set_active(true);
        let stages: Vec<Arc<dyn Stage>> = vec![cache.clone()];

        for n in 0..4 {
            let mut r = numbered(n);
            Next::new(&stages, None).invoke(&mut r);
        }

        assert_eq!(cache.len(), 3);
        let order: Vec<_> = cache
            .snapshot()
            .iter()
            .map(|r| r.get("n").value.clone())
            .collect();
        assert_eq!(order, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_always_forwards() {
        let cache = Arc::new(BoundedCacheStage::new(2));
        cache.set_active(true);
        let probe = Arc::new(crate::pipeline::NoOpStage::new("after"));
        let stages: Vec<Arc<dyn Stage>> = vec![cache.clone(), probe];

        let mut r = numbered(1);
        Next::new(&stages, None).invoke(&mut r);
        // Cached and still delivered downstream.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_disabled_by_default() {
        let cache = Arc::new(BoundedCacheStage::new(2));
        let stages: Vec<Arc<dyn Stage>> = vec![cache.clone()];

        let mut r = numbered(1);
        Next::new(&stages, None).invoke(&mut r);

        // Never opted in, so nothing is observed.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shutdown_clears() {
        let cache = BoundedCacheStage::new(2);
        cache.set_active(true);
        cache.invoke(&mut numbered(1), Next::new(&[], None));
        cache.shutdown();
        assert!(cache.is_empty());
    }
}

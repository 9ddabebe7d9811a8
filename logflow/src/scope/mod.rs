//! Correlated unit-of-work scopes and their private branch pipelines.
//!
//! A scope opens on `Logger::begin_scope`, materializes a private
//! branch of stages spliced between the scope controller and the rest
//! of the main chain, and unwinds when disposed: branch teardown,
//! error aggregation, end-of-scope hook, context-stack pop, in that
//! order, exactly once.

mod controller;

pub use controller::ScopeControllerStage;

use crate::context::ContextStack;
use crate::errors::{ScopeAggregateError, ScopeMisuseError};
use crate::pipeline::ScopeStageConfig;
use crate::pipeline::{Next, Stage};
use crate::record::Record;
use crate::stages::{BoundedCacheStage, BufferStage, CorrelationStage, ElapsedStage};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// The context stack shared by a logger and the scopes opened on it.
pub(crate) type ScopeStack = Arc<Mutex<ContextStack<Arc<ScopeData>>>>;

/// Call-site metadata captured when a scope opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    /// Source file of the call site.
    pub file: String,
    /// Line number.
    pub line: u32,
    /// Column number.
    pub column: u32,
}

impl Caller {
    /// Captures the caller's location.
    #[track_caller]
    #[must_use]
    pub fn here() -> Self {
        let location = std::panic::Location::caller();
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Completion data handed to the end-of-scope hook.
#[derive(Debug)]
pub struct EndOfScope<'a> {
    /// The owning logger's name.
    pub logger: &'a str,
    /// The scope's name.
    pub scope: &'a str,
    /// The scope's correlation id.
    pub correlation_id: &'a str,
    /// Errors captured during the scope's lifetime, merged into one.
    pub error: Option<&'a ScopeAggregateError>,
    /// Where the scope was opened.
    pub caller: &'a Caller,
}

/// Hook invoked once per scope at disposal.
pub type EndScopeHook = Arc<dyn Fn(EndOfScope<'_>) + Send + Sync>;

/// The private branch pipeline materialized for one scope.
///
/// `stages` are owned by the scope and torn down with it; `tail` is the
/// shared main-chain continuation the branch rejoins and is never
/// touched at teardown.
#[derive(Debug)]
pub(crate) struct Branch {
    stages: Vec<Arc<dyn Stage>>,
    tail: Vec<Arc<dyn Stage>>,
    buffer: Option<(usize, Arc<BufferStage>)>,
    cache: Option<Arc<BoundedCacheStage>>,
    elapsed: Option<Arc<ElapsedStage>>,
}

impl Branch {
    /// Instantiates the configured scope stage factories into a fresh
    /// branch. Each scope gets its own instances.
    pub(crate) fn build(configs: &[ScopeStageConfig], tail: Vec<Arc<dyn Stage>>) -> Self {
        let mut stages: Vec<Arc<dyn Stage>> = Vec::with_capacity(configs.len());
        let mut buffer = None;
        let mut cache = None;
        let mut elapsed = None;

        for config in configs {
            match config {
                ScopeStageConfig::Correlation => {
                    stages.push(Arc::new(CorrelationStage::new()));
                }
                ScopeStageConfig::Elapsed { precision } => {
                    let stage = Arc::new(ElapsedStage::new(*precision));
                    elapsed = Some(stage.clone());
                    stages.push(stage);
                }
                ScopeStageConfig::Buffer { bypass_level } => {
                    let stage = Arc::new(BufferStage::new(*bypass_level));
                    // Configuring the stage is the opt-in.
                    stage.set_active(true);
                    buffer = Some((stages.len(), stage.clone()));
                    stages.push(stage);
                }
                ScopeStageConfig::BoundedCache { capacity } => {
                    let stage = Arc::new(BoundedCacheStage::new(*capacity));
                    stage.set_active(true);
                    cache = Some(stage.clone());
                    stages.push(stage);
                }
            }
        }

        Self {
            stages,
            tail,
            buffer,
            cache,
            elapsed,
        }
    }

    pub(crate) fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }
}

/// Shared state of one open unit of work.
///
/// Held behind an `Arc` by the scope handle, the context stack, and any
/// in-flight invocation cursor.
#[derive(Debug)]
pub struct ScopeData {
    name: String,
    logger: String,
    work_item: Option<Value>,
    caller: Caller,
    correlation_id: String,
    correlation_handle: RwLock<Option<String>>,
    parent: Option<Arc<ScopeData>>,
    items: Mutex<HashMap<String, Value>>,
    captures: Mutex<Vec<anyhow::Error>>,
    branch: Branch,
    disposed: AtomicBool,
}

impl ScopeData {
    /// Returns the scope's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning logger's name.
    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Returns the caller-supplied correlation payload, if any.
    #[must_use]
    pub fn work_item(&self) -> Option<&Value> {
        self.work_item.as_ref()
    }

    /// Returns where the scope was opened.
    #[must_use]
    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Returns the correlation id, generated once per scope.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Returns the correlation handle, if one was attached.
    #[must_use]
    pub fn correlation_handle(&self) -> Option<String> {
        self.correlation_handle.read().clone()
    }

    /// Walks the scope tree from parent to root.
    pub fn ancestors(&self) -> impl Iterator<Item = &ScopeData> {
        let mut next = self.parent.as_deref();
        std::iter::from_fn(move || {
            let scope = next?;
            next = scope.parent.as_deref();
            Some(scope)
        })
    }

    /// Returns true once the scope was disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Stores an ambient key/value item on the scope.
    pub fn set_item(&self, key: impl Into<String>, value: Value) {
        self.items.lock().insert(key.into(), value);
    }

    /// Reads an ambient item.
    #[must_use]
    pub fn item(&self, key: &str) -> Option<Value> {
        self.items.lock().get(key).cloned()
    }

    /// Records an error captured while the scope is current.
    ///
    /// Captures are merged into one aggregate at disposal and reported
    /// through the end-of-scope hook.
    pub fn record_error(&self, error: anyhow::Error) {
        self.captures.lock().push(error);
    }

    pub(crate) fn branch_stages(&self) -> &[Arc<dyn Stage>] {
        self.branch.stages()
    }
}

/// A disposable handle for one open unit of work.
///
/// Dropping the handle disposes the scope; calling [`Scope::dispose`]
/// does so explicitly. Disposal must happen in LIFO order relative to
/// other scopes on the same logger.
pub struct Scope {
    inner: Arc<ScopeData>,
    stack: ScopeStack,
    hook: Option<EndScopeHook>,
}

impl Scope {
    /// Opens a scope: builds its branch, registers it as current.
    pub(crate) fn open(
        name: impl Into<String>,
        logger: impl Into<String>,
        work_item: Option<Value>,
        caller: Caller,
        configs: &[ScopeStageConfig],
        tail: Vec<Arc<dyn Stage>>,
        stack: ScopeStack,
        hook: Option<EndScopeHook>,
    ) -> Self {
        // One critical section for the parent read and the push, so
        // concurrent opens on a shared stack cannot interleave between
        // the captured parent and the frame order.
        let mut frames = stack.lock();
        let inner = Arc::new(ScopeData {
            name: name.into(),
            logger: logger.into(),
            work_item,
            caller,
            correlation_id: Uuid::new_v4().to_string(),
            correlation_handle: RwLock::new(None),
            parent: frames.current().cloned(),
            items: Mutex::new(HashMap::new()),
            captures: Mutex::new(Vec::new()),
            branch: Branch::build(configs, tail),
            disposed: AtomicBool::new(false),
        });
        frames.push(inner.clone());
        drop(frames);
        Self { inner, stack, hook }
    }

    /// Returns the scope's shared state.
    #[must_use]
    pub fn data(&self) -> &ScopeData {
        &self.inner
    }

    /// Returns the scope's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the scope's correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        self.inner.correlation_id()
    }

    /// Attaches a correlation handle.
    pub fn set_correlation_handle(&self, handle: impl Into<String>) {
        *self.inner.correlation_handle.write() = Some(handle.into());
    }

    /// Stores an ambient key/value item on the scope.
    pub fn set_item(&self, key: impl Into<String>, value: Value) {
        self.inner.set_item(key, value);
    }

    /// Records an error captured while this scope is current.
    pub fn record_error(&self, error: anyhow::Error) {
        self.inner.record_error(error);
    }

    /// Drains the branch buffer, forwarding each record, in original
    /// order, through the continuation after the buffer stage.
    pub fn flush(&self) {
        let Some((index, buffer)) = &self.inner.branch.buffer else {
            return;
        };
        let rest = &self.inner.branch.stages[index + 1..];
        for mut record in buffer.drain() {
            Next::with_tail(rest, &self.inner.branch.tail, Some(&self.inner)).invoke(&mut record);
        }
    }

    /// Switches the branch buffer on or off; off, it is behaviorally
    /// absent and records pass straight through.
    pub fn set_buffering(&self, active: bool) {
        if let Some((_, buffer)) = &self.inner.branch.buffer {
            buffer.set_active(active);
        }
    }

    /// Switches the branch's bounded cache on or off.
    pub fn set_caching(&self, active: bool) {
        if let Some(cache) = &self.inner.branch.cache {
            cache.set_active(active);
        }
    }

    /// Discards the branch buffer without forwarding anything.
    pub fn clear_buffer(&self) {
        if let Some((_, buffer)) = &self.inner.branch.buffer {
            buffer.clear();
        }
    }

    /// Returns the records held by the branch's bounded cache.
    #[must_use]
    pub fn cached(&self) -> Vec<Record> {
        self.inner
            .branch
            .cache
            .as_ref()
            .map(|c| c.snapshot())
            .unwrap_or_default()
    }

    /// Restarts the branch's elapsed-time timer.
    pub fn reset_elapsed(&self) {
        if let Some(elapsed) = &self.inner.branch.elapsed {
            elapsed.reset();
        }
    }

    /// Disposes the scope: branch teardown, error aggregation, hook,
    /// context-stack pop.
    ///
    /// Must run exactly once. A second call, or one out of LIFO order,
    /// is a programmer error: loud in debug builds, logged and ignored
    /// in release, and it never pops another scope's frame.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeMisuseError`] on a second disposal, or when the
    /// scope's frame is not current (out-of-order disposal). The branch
    /// is torn down and the hook runs either way; the misused stack is
    /// left untouched.
    pub fn try_dispose(&self) -> Result<(), ScopeMisuseError> {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return Err(ScopeMisuseError::new(
                self.inner.name.clone(),
                "disposed twice",
            ));
        }

        for stage in self.inner.branch.stages() {
            stage.shutdown();
        }

        let captures: Vec<anyhow::Error> = self.inner.captures.lock().drain(..).collect();
        let error = (!captures.is_empty())
            .then(|| ScopeAggregateError::new(self.inner.name.clone(), captures));

        if let Some(hook) = &self.hook {
            hook(EndOfScope {
                logger: &self.inner.logger,
                scope: &self.inner.name,
                correlation_id: &self.inner.correlation_id,
                error: error.as_ref(),
                caller: &self.inner.caller,
            });
        }

        let mut stack = self.stack.lock();
        match stack.current() {
            Some(top) if Arc::ptr_eq(top, &self.inner) => {
                stack.pop();
                Ok(())
            }
            _ => {
                drop(stack);
                Err(ScopeMisuseError::new(
                    self.inner.name.clone(),
                    "disposed out of order; its frame is not current",
                ))
            }
        }
    }

    /// Disposes the scope, reporting misuse instead of returning it.
    ///
    /// Equivalent to [`Scope::try_dispose`] with misuse handled by
    /// failing loudly in debug builds and logging in release.
    pub fn dispose(&self) {
        if let Err(err) = self.try_dispose() {
            tracing::error!(scope = %self.inner.name, error = %err, "scope misuse");
            debug_assert!(false, "{err}");
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.inner.name)
            .field("correlation_id", &self.inner.correlation_id)
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.inner.is_disposed() {
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ElapsedPrecision;
    use serde_json::json;

    fn stack() -> ScopeStack {
        Arc::new(Mutex::new(ContextStack::new()))
    }

    fn open(name: &str, stack: &ScopeStack) -> Scope {
        Scope::open(
            name,
            "test",
            None,
            Caller::here(),
            &[ScopeStageConfig::Correlation],
            Vec::new(),
            stack.clone(),
            None,
        )
    }

    #[test]
    fn test_open_dispose_round_trip() {
        let stack = stack();
        assert!(stack.lock().is_empty());

        let scope = open("job", &stack);
        assert_eq!(stack.lock().depth(), 1);

        scope.dispose();
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_drop_disposes() {
        let stack = stack();
        {
            let _scope = open("job", &stack);
            assert_eq!(stack.lock().depth(), 1);
        }
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_nested_lifo_restores_pre_a_state() {
        let stack = stack();
        let a = open("a", &stack);
        let b = open("b", &stack);

        assert_eq!(b.data().ancestors().count(), 1);

        b.dispose();
        assert_eq!(stack.lock().depth(), 1);
        a.dispose();
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_try_dispose_reports_double_disposal() {
        let stack = stack();
        let scope = open("job", &stack);
        assert!(scope.try_dispose().is_ok());

        let err = scope.try_dispose().unwrap_err();
        assert!(err.to_string().contains("disposed twice"));
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_try_dispose_reports_out_of_order_disposal() {
        let stack = stack();
        let a = open("a", &stack);
        let b = open("b", &stack);

        let err = a.try_dispose().unwrap_err();
        assert_eq!(err.scope, "a");
        assert!(err.message.contains("out of order"));
        // The misuse must not pop b's frame.
        assert!(Arc::ptr_eq(
            stack.lock().current().expect("b still current"),
            &b.inner
        ));
        b.dispose();
    }

    #[test]
    #[should_panic(expected = "disposed twice")]
    fn test_double_dispose_is_loud() {
        let stack = stack();
        let scope = open("job", &stack);
        scope.dispose();
        scope.dispose();
    }

    #[test]
    #[should_panic(expected = "disposed out of order")]
    fn test_out_of_order_dispose_is_detected() {
        let stack = stack();
        let a = open("a", &stack);
        let _b = open("b", &stack);
        a.dispose();
    }

    #[test]
    fn test_out_of_order_dispose_leaves_sibling_frame() {
        let stack = stack();
        let a = open("a", &stack);
        let b = open("b", &stack);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| a.dispose()));
        assert!(result.is_err());

        // The misuse must not pop b's frame.
        assert!(Arc::ptr_eq(
            stack.lock().current().expect("b still current"),
            &b.inner
        ));
        b.dispose();
    }

    #[test]
    fn test_concurrent_opens_keep_parent_links_consistent() {
        let stack = stack();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stack = stack.clone();
                std::thread::spawn(move || {
                    Scope::open(
                        "worker",
                        "test",
                        None,
                        Caller::here(),
                        &[],
                        Vec::new(),
                        stack,
                        None,
                    )
                })
            })
            .collect();
        let scopes: Vec<Scope> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Each frame's recorded parent is exactly the frame beneath it.
        let order: Vec<Arc<ScopeData>> = stack.lock().ancestors().cloned().collect();
        for pair in order.windows(2) {
            assert!(pair[0]
                .parent
                .as_ref()
                .is_some_and(|p| Arc::ptr_eq(p, &pair[1])));
        }
        assert!(order.last().expect("frames pushed").parent.is_none());

        // Unwind in stack order.
        for data in &order {
            let scope = scopes
                .iter()
                .find(|s| Arc::ptr_eq(&s.inner, data))
                .expect("every frame has a handle");
            scope.dispose();
        }
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_correlation_id_memoized() {
        let stack = stack();
        let scope = open("job", &stack);
        let first = scope.correlation_id().to_string();
        assert_eq!(scope.correlation_id(), first);
        assert!(!first.is_empty());
        scope.dispose();
    }

    #[test]
    fn test_items_and_error_capture() {
        let stack = stack();
        let captured: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = captured.clone();

        let hook: EndScopeHook = Arc::new(move |end: EndOfScope<'_>| {
            seen.lock().push(end.error.map_or(0, ScopeAggregateError::len));
        });

        let scope = Scope::open(
            "job",
            "test",
            Some(json!({"order": 42})),
            Caller::here(),
            &[],
            Vec::new(),
            stack.clone(),
            Some(hook),
        );
        scope.set_item("state", json!("pending"));
        assert_eq!(scope.data().item("state"), Some(json!("pending")));

        scope.record_error(anyhow::anyhow!("first failure"));
        scope.record_error(anyhow::anyhow!("second failure"));
        scope.dispose();

        assert_eq!(*captured.lock(), vec![2]);
    }

    #[test]
    fn test_branch_instances_are_fresh_per_scope() {
        let stack = stack();
        let configs = vec![ScopeStageConfig::Elapsed {
            precision: ElapsedPrecision::Millis,
        }];

        let a = Scope::open(
            "a",
            "test",
            None,
            Caller::here(),
            &configs,
            Vec::new(),
            stack.clone(),
            None,
        );
        let b = Scope::open(
            "b",
            "test",
            None,
            Caller::here(),
            &configs,
            Vec::new(),
            stack.clone(),
            None,
        );

        let a_stage = &a.inner.branch.stages()[0];
        let b_stage = &b.inner.branch.stages()[0];
        assert!(!Arc::ptr_eq(a_stage, b_stage));

        b.dispose();
        a.dispose();
    }
}

//! Stage trait and the index-based invocation cursor.

use crate::record::Record;
use crate::scope::ScopeData;
use std::fmt::Debug;
use std::sync::Arc;

/// Declared relative ranks for stage ordering.
///
/// Used by the ad-hoc insertion algorithm: a new stage lands immediately
/// before the first existing stage whose rank is greater or equal.
pub mod ranks {
    /// Head stage stamping the logger name.
    pub const HEAD: i32 = 0;
    /// Scope controller, directly after the head.
    pub const CONTROLLER: i32 = 5;
    /// Correlation stamping.
    pub const CORRELATION: i32 = 10;
    /// Elapsed-time stamping.
    pub const ELAPSED: i32 = 20;
    /// Record filtering.
    pub const FILTER: i32 = 30;
    /// Value destructuring and serialization.
    pub const DESTRUCTURE: i32 = 40;
    /// Default rank for ad-hoc stages.
    pub const DEFAULT: i32 = 50;
    /// Property renaming and recasing.
    pub const RENAME: i32 = 60;
    /// Record buffering.
    pub const BUFFER: i32 = 70;
    /// Bounded diagnostic caching.
    pub const CACHE: i32 = 80;
    /// Terminal fan-out.
    pub const TERMINAL: i32 = 100;
}

/// One link in a processing chain.
///
/// A stage may mutate the record and forward it, decline to forward
/// (short-circuiting, as filtering and buffering do), or fan out to
/// sinks instead of forwarding (terminal stages). Stages must be
/// idempotent with respect to being invoked zero or more times per log
/// call; buffering defers delivery, never duplicates it.
pub trait Stage: Send + Sync + Debug {
    /// Returns the stage's name.
    fn name(&self) -> &str;

    /// Returns the stage's declared relative rank.
    fn rank(&self) -> i32 {
        ranks::DEFAULT
    }

    /// Whether the stage participates in this invocation.
    ///
    /// A disabled stage is behaviorally absent from the chain for that
    /// invocation. May be computed, e.g. "enabled only while opted in".
    fn enabled(&self, _record: &Record) -> bool {
        true
    }

    /// Processes the record, optionally forwarding it via `next`.
    fn invoke(&self, record: &mut Record, next: Next<'_>);

    /// Releases resources owned by the stage (queues, timers).
    ///
    /// Called exactly once when the owning branch is torn down; never
    /// called on stages of the shared main chain by a scope.
    fn shutdown(&self) {}
}

/// Cursor over the remaining stages of the current invocation.
///
/// Replaces mutable prev/next links: the chain is an immutable stage
/// slice and "next" is index-based. A scope branch is a temporary slice
/// spliced in front of the main chain's continuation; when the branch
/// segment is exhausted the cursor falls through to the rejoin tail.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Stage>],
    tail: &'a [Arc<dyn Stage>],
    scope: Option<&'a ScopeData>,
}

impl<'a> Next<'a> {
    /// Creates a cursor over a single stage segment.
    pub(crate) fn new(stages: &'a [Arc<dyn Stage>], scope: Option<&'a ScopeData>) -> Self {
        Self {
            rest: stages,
            tail: &[],
            scope,
        }
    }

    /// Creates a cursor over a branch segment plus its rejoin tail.
    pub(crate) fn with_tail(
        rest: &'a [Arc<dyn Stage>],
        tail: &'a [Arc<dyn Stage>],
        scope: Option<&'a ScopeData>,
    ) -> Self {
        Self { rest, tail, scope }
    }

    /// Returns the scope current for this invocation, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&'a ScopeData> {
        self.scope
    }

    /// Redirects the cursor into a scope's private branch.
    ///
    /// The stages the cursor had left become the rejoin tail, so the
    /// branch flows back into the main chain automatically.
    pub(crate) fn detour(self, branch: &'a [Arc<dyn Stage>]) -> Next<'a> {
        debug_assert!(
            self.tail.is_empty(),
            "detour must start from the main chain"
        );
        Next {
            rest: branch,
            tail: self.rest,
            scope: self.scope,
        }
    }

    /// Forwards the record to the next enabled stage.
    ///
    /// Transient properties are dropped at the boundary. Disabled stages
    /// are skipped. Returns without effect when the chain is exhausted.
    pub fn invoke(mut self, record: &mut Record) {
        record.strip_transient();
        loop {
            let Some((stage, rest)) = self.rest.split_first() else {
                if self.tail.is_empty() {
                    return;
                }
                self.rest = self.tail;
                self.tail = &[];
                continue;
            };
            self.rest = rest;
            if !stage.enabled(record) {
                continue;
            }
            let next = Next {
                rest: self.rest,
                tail: self.tail,
                scope: self.scope,
            };
            stage.invoke(record, next);
            return;
        }
    }
}

/// A no-op pass-through stage for tests and placeholders.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
    rank: i32,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: ranks::DEFAULT,
        }
    }

    /// Creates a no-op stage with an explicit rank.
    #[must_use]
    pub fn with_rank(name: impl Into<String>, rank: i32) -> Self {
        Self {
            name: name.into(),
            rank,
        }
    }
}

impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn rank(&self) -> i32 {
        self.rank
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        next.invoke(record);
    }
}

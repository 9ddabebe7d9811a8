//! Logger handles: the entry point for emitting records and opening
//! scopes on a named chain.

use crate::level::Level;
use crate::pipeline::{Chain, ScopeStageConfig};
use crate::record::Record;
use crate::scope::{Caller, EndScopeHook, Scope, ScopeStack};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A handle bound to one named chain.
///
/// A logger owns its context stack of open scopes. Cloning a logger
/// forks that stack: the clone starts with the same open scopes but
/// scopes opened or disposed afterwards on either handle are invisible
/// to the other. The chain itself stays shared.
pub struct Logger {
    name: Arc<str>,
    chain: Arc<Chain>,
    scope_configs: Arc<[ScopeStageConfig]>,
    hook: Option<EndScopeHook>,
    min_level: Level,
    context: ScopeStack,
}

impl Logger {
    pub(crate) fn new(
        name: &str,
        chain: Arc<Chain>,
        scope_configs: Arc<[ScopeStageConfig]>,
        hook: Option<EndScopeHook>,
        min_level: Level,
    ) -> Self {
        Self {
            name: Arc::from(name),
            chain,
            scope_configs,
            hook,
            min_level,
            context: Arc::new(Mutex::new(crate::context::ContextStack::new())),
        }
    }

    /// Returns the logger's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether a record at `level` would pass the level gate.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Opens a scope for a unit of work, making it the current scope
    /// for records emitted through this handle.
    ///
    /// The call site is captured as the scope's caller metadata.
    #[track_caller]
    pub fn begin_scope(&self, name: impl Into<String>, work_item: Option<Value>) -> Scope {
        Scope::open(
            name,
            self.name.to_string(),
            work_item,
            Caller::here(),
            &self.scope_configs,
            self.chain.continuation(),
            self.context.clone(),
            self.hook.clone(),
        )
    }

    /// Returns the number of scopes currently open on this handle.
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.context.lock().depth()
    }

    /// Builds a record at `level`, lets the caller populate it, and
    /// dispatches it down the chain.
    ///
    /// The closure never runs when the level gate rejects the record.
    pub fn log(&self, level: Level, populate: impl FnOnce(&mut Record)) {
        if !self.enabled(level) {
            return;
        }
        let mut record = Record::new(level);
        populate(&mut record);
        self.dispatch(&mut record);
    }

    /// Dispatches an already-built record down the chain.
    pub fn log_record(&self, mut record: Record) {
        if !self.enabled(record.level()) {
            return;
        }
        self.dispatch(&mut record);
    }

    /// Forks this handle: same chain, independent scope stack.
    ///
    /// Equivalent to [`Clone::clone`]; spelled out for call sites where
    /// the fork is the point.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    fn dispatch(&self, record: &mut Record) {
        // Clone the current scope handle out and release the lock
        // before running the chain; stages may open nested scopes.
        let scope = self.context.lock().current().cloned();
        self.chain.dispatch(record, scope.as_deref());
    }
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        let forked = self.context.lock().clone();
        Self {
            name: self.name.clone(),
            chain: self.chain.clone(),
            scope_configs: self.scope_configs.clone(),
            hook: self.hook.clone(),
            min_level: self.min_level,
            context: Arc::new(Mutex::new(forked)),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("chain_len", &self.chain.len())
            .field("min_level", &self.min_level)
            .field("scope_depth", &self.context.lock().depth())
            .finish()
    }
}

//! Error types for the logflow engine.
//!
//! The taxonomy separates configuration and misuse errors, which surface
//! to the caller, from degraded paths (sink failures, serialization
//! failures, scope-captured errors) which are contained at their stage.

use thiserror::Error;

/// The main error type for logflow operations.
#[derive(Debug, Error)]
pub enum LogflowError {
    /// A configuration error occurred.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A sink failed to accept a record.
    #[error("{0}")]
    Sink(#[from] SinkError),

    /// A value could not be serialized.
    #[error("{0}")]
    Serialize(#[from] SerializeError),

    /// A scope was used incorrectly.
    #[error("{0}")]
    ScopeMisuse(#[from] ScopeMisuseError),

    /// Errors captured during a scope's lifetime.
    #[error("{0}")]
    ScopeAggregate(#[from] ScopeAggregateError),
}

/// Error raised when stage or chain configuration is invalid.
///
/// Configuration errors are fatal at first use of the affected logger
/// and are never swallowed.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigError {
    /// The error message.
    pub message: String,
    /// The stage the error relates to, if any.
    pub stage: Option<String>,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage: None,
        }
    }

    /// Attaches the offending stage name.
    #[must_use]
    pub fn for_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

/// Error raised by a sink during delivery.
///
/// Caught per-sink at the echo stage; never propagates to the caller or
/// to other sinks.
#[derive(Debug, Clone, Error)]
#[error("sink '{sink}' failed: {message}")]
pub struct SinkError {
    /// The name of the failing sink.
    pub sink: String,
    /// The failure message.
    pub message: String,
}

impl SinkError {
    /// Creates a new sink error.
    #[must_use]
    pub fn new(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a value cannot be serialized.
///
/// Caught at the destructure stage, which degrades to a type-name
/// placeholder instead of failing the pipeline.
#[derive(Debug, Clone, Error)]
#[error("serialization failed: {message}")]
pub struct SerializeError {
    /// The failure message.
    pub message: String,
}

impl SerializeError {
    /// Creates a new serialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error describing incorrect scope usage.
///
/// These are programmer errors: disposing a scope twice, disposing out
/// of LIFO order, or using scope-dependent stages without an open scope.
/// They fail loudly in debug builds.
#[derive(Debug, Clone, Error)]
#[error("scope '{scope}' misused: {message}")]
pub struct ScopeMisuseError {
    /// The scope involved.
    pub scope: String,
    /// What went wrong.
    pub message: String,
}

impl ScopeMisuseError {
    /// Creates a new scope misuse error.
    #[must_use]
    pub fn new(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            message: message.into(),
        }
    }
}

/// Aggregate of all errors captured while a scope was current.
///
/// Built at scope disposal and delivered through the end-of-scope hook
/// rather than re-thrown through arbitrary caller code paths.
#[derive(Debug, Error)]
#[error("scope '{scope}' completed with {} captured error(s)", captures.len())]
pub struct ScopeAggregateError {
    /// The scope the errors were captured in.
    pub scope: String,
    /// The captured errors, in capture order.
    pub captures: Vec<anyhow::Error>,
}

impl ScopeAggregateError {
    /// Creates an aggregate from captured errors.
    #[must_use]
    pub fn new(scope: impl Into<String>, captures: Vec<anyhow::Error>) -> Self {
        Self {
            scope: scope.into(),
            captures,
        }
    }

    /// Returns the number of captured errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Returns true when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Formats every captured error, in capture order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.captures.iter().map(|e| format!("{e:#}")).collect()
    }
}

//! Pipeline building and execution.
//!
//! This module provides:
//! - The stage trait and index-based invocation cursor
//! - Immutable per-logger chains with rank-based ad-hoc insertion
//! - Declarative chain specifications
//! - The validating builder and the per-logger chain registry

mod builder;
mod chain;
mod registry;
mod spec;
mod stage;

pub use builder::PipelineBuilder;
pub use chain::Chain;
pub use registry::Pipelines;
pub use spec::{ChainSpec, ElapsedPrecision, RenameRule, ScopeStageConfig, StageConfig};
pub use stage::{ranks, Next, NoOpStage, Stage};

pub(crate) use chain::CONTROLLER_STAGE;

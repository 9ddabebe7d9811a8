//! Chain construction from declarative specifications.

use super::chain::Chain;
use super::registry::Pipelines;
use super::spec::{ChainSpec, ScopeStageConfig, StageConfig};
use super::stage::Stage;
use crate::errors::ConfigError;
use crate::level::Level;
use crate::scope::{EndOfScope, EndScopeHook, ScopeControllerStage};
use crate::serialize::{JsonSerializer, Serializer};
use crate::sinks::{NoOpSink, Sink};
use crate::stages::{DestructureStage, EchoStage, FilterStage, LoggerNameStage, RenameStage};
use std::fmt;
use std::sync::Arc;

/// Builds logger chains from a declarative specification.
///
/// The builder is the single configuration surface: stage list, scope
/// stage factories, sinks, serializer, minimum level and the
/// end-of-scope hook. A chain is resolved lazily, once per logger name,
/// when that logger is first requested.
#[derive(Clone)]
pub struct PipelineBuilder {
    spec: ChainSpec,
    sinks: Vec<Arc<dyn Sink>>,
    serializer: Arc<dyn Serializer>,
    hook: Option<EndScopeHook>,
    min_level: Level,
}

impl PipelineBuilder {
    /// Creates a builder with an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: ChainSpec::new(),
            sinks: Vec::new(),
            serializer: Arc::new(JsonSerializer),
            hook: None,
            min_level: Level::Trace,
        }
    }

    /// Replaces the whole chain specification.
    #[must_use]
    pub fn with_spec(mut self, spec: ChainSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Appends a main-chain stage configuration.
    #[must_use]
    pub fn stage(mut self, config: StageConfig) -> Self {
        self.spec.stages.push(config);
        self
    }

    /// Appends a scope-branch stage factory.
    #[must_use]
    pub fn scope_stage(mut self, config: ScopeStageConfig) -> Self {
        self.spec.scope_stages.push(config);
        self
    }

    /// Registers a sink for the terminal echo stage.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replaces the injectable serializer used by destructuring.
    #[must_use]
    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Sets the completion hook invoked once per disposed scope.
    #[must_use]
    pub fn on_end_scope(
        mut self,
        hook: impl Fn(EndOfScope<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Sets the minimum level loggers forward at all.
    #[must_use]
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Finishes the configuration, producing the logger registry.
    #[must_use]
    pub fn build(self) -> Pipelines {
        Pipelines::new(self)
    }

    pub(crate) fn scope_configs(&self) -> &[ScopeStageConfig] {
        &self.spec.scope_stages
    }

    pub(crate) fn hook(&self) -> Option<EndScopeHook> {
        self.hook.clone()
    }

    pub(crate) fn level_gate(&self) -> Level {
        self.min_level
    }

    /// Instantiates the chain for one logger name.
    ///
    /// The chain always starts with the logger-name head followed by
    /// the scope controller, and ends with the terminal echo stage.
    /// Invalid stage configuration fails here, at first use.
    pub(crate) fn resolve_chain(&self, logger: &str) -> Result<Chain, ConfigError> {
        let mut stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(LoggerNameStage::new(logger)),
            Arc::new(ScopeControllerStage::new()),
        ];

        for config in &self.spec.stages {
            let stage: Arc<dyn Stage> = match config {
                StageConfig::Filter { min_level } => {
                    Arc::new(FilterStage::min_level(*min_level))
                }
                StageConfig::Destructure => {
                    Arc::new(DestructureStage::new(self.serializer.clone()))
                }
                StageConfig::Rename { rules } => Arc::new(RenameStage::new(rules)?),
            };
            stages.push(stage);
        }

        let sinks = if self.sinks.is_empty() {
            vec![Arc::new(NoOpSink) as Arc<dyn Sink>]
        } else {
            self.sinks.clone()
        };
        stages.push(Arc::new(EchoStage::new(sinks)));

        Ok(Chain::new(logger, stages))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("spec", &self.spec)
            .field("sinks", &self.sinks.len())
            .field("min_level", &self.min_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spec::RenameRule;

    #[test]
    fn test_chain_has_head_controller_and_terminal() {
        let builder = PipelineBuilder::new().stage(StageConfig::Filter {
            min_level: Level::Info,
        });
        let chain = builder.resolve_chain("app").unwrap();

        let names: Vec<_> = chain.stages().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["logger_name", "scope_controller", "filter", "echo"]
        );
    }

    #[test]
    fn test_invalid_rename_config_fails_at_resolution() {
        let builder = PipelineBuilder::new().stage(StageConfig::Rename { rules: vec![] });
        assert!(builder.resolve_chain("app").is_err());
    }

    #[test]
    fn test_valid_rename_config_resolves() {
        let builder = PipelineBuilder::new().stage(StageConfig::Rename {
            rules: vec![RenameRule::Replace {
                from: "msg".to_string(),
                to: "message".to_string(),
            }],
        });
        assert!(builder.resolve_chain("app").is_ok());
    }

    #[test]
    fn test_distinct_loggers_get_distinct_stage_instances() {
        let builder = PipelineBuilder::new().stage(StageConfig::Destructure);
        let a = builder.resolve_chain("a").unwrap();
        let b = builder.resolve_chain("b").unwrap();

        for (left, right) in a.stages().iter().zip(b.stages()) {
            assert!(!Arc::ptr_eq(left, right));
        }
    }
}

//! Per-logger chain cache.

use super::builder::PipelineBuilder;
use super::chain::Chain;
use super::stage::Stage;
use crate::errors::{ConfigError, LogflowError};
use crate::logger::Logger;
use dashmap::DashMap;
use std::sync::Arc;

/// The logger registry: resolves and caches one chain per logger name.
///
/// Chains are built lazily on first use. Concurrent first use of the
/// same name never produces two competing chains; the map entry is
/// built under its shard lock and the first writer wins.
#[derive(Debug, Clone)]
pub struct Pipelines {
    inner: Arc<PipelinesInner>,
}

#[derive(Debug)]
struct PipelinesInner {
    builder: PipelineBuilder,
    chains: DashMap<String, Arc<Chain>>,
}

impl Pipelines {
    /// Creates the registry from a finished builder.
    #[must_use]
    pub(crate) fn new(builder: PipelineBuilder) -> Self {
        Self {
            inner: Arc::new(PipelinesInner {
                builder,
                chains: DashMap::new(),
            }),
        }
    }

    /// Returns a logger handle for the named chain, building the chain
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LogflowError::Config`] when the chain specification is
    /// invalid; configuration errors are fatal at first use and never
    /// swallowed.
    pub fn logger(&self, name: &str) -> Result<Logger, LogflowError> {
        let chain = self.chain(name)?;
        Ok(Logger::new(
            name,
            chain,
            self.inner.builder.scope_configs().to_vec().into(),
            self.inner.builder.hook(),
            self.inner.builder.level_gate(),
        ))
    }

    /// Returns the cached chain for a logger name, building it if absent.
    pub(crate) fn chain(&self, name: &str) -> Result<Arc<Chain>, ConfigError> {
        let entry = self
            .inner
            .chains
            .entry(name.to_string())
            .or_try_insert_with(|| self.inner.builder.resolve_chain(name).map(Arc::new))?;
        Ok(entry.value().clone())
    }

    /// Inserts an ad-hoc stage into a logger's chain by declared rank.
    ///
    /// The cached chain is replaced with the extended one; loggers
    /// requested afterwards observe the new stage. Used for transient
    /// diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`LogflowError::Config`] when the chain cannot be built.
    pub fn attach(&self, name: &str, stage: Arc<dyn Stage>) -> Result<(), LogflowError> {
        let chain = self.chain(name)?;
        self.inner
            .chains
            .insert(name.to_string(), Arc::new(chain.with_stage(stage)));
        Ok(())
    }

    /// Returns the number of cached chains.
    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.inner.chains.len()
    }
}

//! Immutable stage chains.

use super::stage::{Next, Stage};
use crate::record::Record;
use crate::scope::ScopeData;
use std::sync::Arc;

/// Name of the scope controller stage, used to locate the splice point.
pub(crate) const CONTROLLER_STAGE: &str = "scope_controller";

/// One logger's processing chain, built once and never mutated.
///
/// Ad-hoc insertion produces a new chain value instead of patching
/// links, so a chain can be dispatched concurrently without guarding.
#[derive(Debug, Clone)]
pub struct Chain {
    logger: Arc<str>,
    stages: Arc<[Arc<dyn Stage>]>,
    controller_index: Option<usize>,
}

impl Chain {
    /// Creates a chain from an ordered stage list.
    #[must_use]
    pub(crate) fn new(logger: impl Into<Arc<str>>, stages: Vec<Arc<dyn Stage>>) -> Self {
        let controller_index = stages.iter().position(|s| s.name() == CONTROLLER_STAGE);
        Self {
            logger: logger.into(),
            stages: stages.into(),
            controller_index,
        }
    }

    /// Returns the owning logger's name.
    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Returns the chain's stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true for a chain with no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs one record through the chain.
    pub fn dispatch(&self, record: &mut Record, scope: Option<&ScopeData>) {
        Next::new(&self.stages, scope).invoke(record);
    }

    /// The main-chain continuation a scope branch rejoins: everything
    /// after the scope controller.
    #[must_use]
    pub(crate) fn continuation(&self) -> Vec<Arc<dyn Stage>> {
        match self.controller_index {
            Some(i) => self.stages[i + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Inserts an ad-hoc stage by declared rank, returning a new chain.
    ///
    /// The stage lands immediately before the first existing stage whose
    /// rank is greater or equal; with no such stage it is appended at
    /// the tail, immediately before the terminal stage.
    #[must_use]
    pub fn with_stage(&self, stage: Arc<dyn Stage>) -> Self {
        let mut stages: Vec<Arc<dyn Stage>> = self.stages.to_vec();
        let rank = stage.rank();
        let at = stages
            .iter()
            .position(|s| s.rank() >= rank)
            .unwrap_or_else(|| stages.len().saturating_sub(1));
        stages.insert(at, stage);
        Self::new(self.logger.clone(), stages)
    }
}

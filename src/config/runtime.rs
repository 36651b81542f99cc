// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{GraphConfig, StepGraph, StepRegistry};
use crate::engine::Launcher;
use crate::errors::EngineError;

/// Runtime builder - turns a graph configuration into a validated graph and a launcher.
///
/// # Examples
///
/// ```
/// use rowflow::config::{GraphConfig, RuntimeBuilder, StepConfig};
///
/// let config = GraphConfig {
///     steps: vec![StepConfig::new("only", "pass_through")],
///     ..Default::default()
/// };
///
/// let (graph, _launcher) = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(graph.steps().len(), 1);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Validate `cfg` and pair it with a launcher over the built-in step registry.
    pub fn from_config(cfg: &GraphConfig) -> Result<(StepGraph, Launcher), EngineError> {
        Self::with_registry(cfg, StepRegistry::with_builtin_steps())
    }

    /// Same as [`from_config`](Self::from_config) with a caller-supplied registry.
    pub fn with_registry(
        cfg: &GraphConfig,
        registry: StepRegistry,
    ) -> Result<(StepGraph, Launcher), EngineError> {
        let graph = StepGraph::from_config(cfg).map_err(EngineError::Validation)?;
        Ok((graph, Launcher::new(registry)))
    }
}

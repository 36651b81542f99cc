// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::StepConfig;
use crate::errors::RegistryError;
use crate::traits::Step;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Factory creating one step copy from its configuration.
pub type StepFactory = Arc<dyn Fn(&StepConfig) -> Result<Box<dyn Step>, String> + Send + Sync>;

/// Explicit registry mapping step type identifiers to factories.
///
/// The launcher asks the registry for one fresh step object per copy, so
/// factories are called `copies` times for each node. Registration is
/// explicit; there is no discovery.
///
/// # Examples
///
/// ```
/// use rowflow::config::{StepConfig, StepRegistry};
///
/// let registry = StepRegistry::with_builtin_steps();
/// assert!(registry.contains("pass_through"));
///
/// let step = registry.create(&StepConfig::new("copy_rows", "pass_through")).unwrap();
/// assert_eq!(step.name(), "pass_through");
///
/// let err = registry.create(&StepConfig::new("x", "no_such_type")).err().unwrap();
/// assert!(err.to_string().contains("no_such_type"));
/// ```
#[derive(Clone, Default)]
pub struct StepRegistry(HashMap<String, StepFactory>);

impl StepRegistry {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registry pre-populated with every built-in step type.
    pub fn with_builtin_steps() -> Self {
        let mut registry = Self::new();
        crate::steps::BuiltinSteps::register_all(&mut registry);
        registry
    }

    /// Register (or replace) the factory for `type_id`.
    pub fn register<F>(&mut self, type_id: impl Into<String>, factory: F)
    where
        F: Fn(&StepConfig) -> Result<Box<dyn Step>, String> + Send + Sync + 'static,
    {
        self.0.insert(type_id.into(), Arc::new(factory));
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.0.contains_key(type_id)
    }

    /// Registered type identifiers, sorted.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.0.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Create one step object for `config`.
    pub fn create(&self, config: &StepConfig) -> Result<Box<dyn Step>, RegistryError> {
        let factory = self
            .0
            .get(&config.type_id)
            .ok_or_else(|| RegistryError::UnknownStepType {
                step_id: config.id.clone(),
                type_id: config.type_id.clone(),
            })?;

        factory(config).map_err(|reason| RegistryError::StepCreationFailed {
            step_id: config.id.clone(),
            type_id: config.type_id.clone(),
            reason,
        })
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepRegistry").field(&self.type_ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::stub::FailingInitStep;

    #[test]
    fn test_register_and_create() {
        let mut registry = StepRegistry::new();
        registry.register("failing_init", |_cfg| Ok(Box::new(FailingInitStep) as Box<dyn Step>));

        assert!(registry.contains("failing_init"));
        assert_eq!(registry.type_ids(), vec!["failing_init"]);
        let step = registry.create(&StepConfig::new("s1", "failing_init")).unwrap();
        assert_eq!(step.name(), "failing_init");
    }

    #[test]
    fn test_unknown_type() {
        let registry = StepRegistry::new();
        let err = registry.create(&StepConfig::new("s1", "missing")).err().unwrap();
        assert_eq!(
            err,
            RegistryError::UnknownStepType {
                step_id: "s1".to_string(),
                type_id: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_factory_failure_is_wrapped() {
        let mut registry = StepRegistry::new();
        registry.register("picky", |_cfg| Err("missing option 'field'".to_string()));

        let err = registry.create(&StepConfig::new("s1", "picky")).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Failed to create picky step 's1': missing option 'field'"
        );
    }

    #[test]
    fn test_builtin_registry_lists_types() {
        let registry = StepRegistry::with_builtin_steps();
        for type_id in crate::steps::BuiltinSteps::list_available_types() {
            assert!(registry.contains(type_id), "missing {}", type_id);
        }
    }
}

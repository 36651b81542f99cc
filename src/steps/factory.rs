// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{StepConfig, StepRegistry};
use crate::traits::Step;

use super::*;

/// Factory for the step types that ship with the engine.
pub struct BuiltinSteps;

impl BuiltinSteps {
    /// Create a step object from its configuration.
    ///
    /// The `type` field of the config selects the step:
    /// - "row_generator" -> RowGenerator (source, options required for anything but a sequence)
    /// - "pass_through" -> PassThrough
    /// - "prioritize_streams" -> PassThrough draining inputs in hop order
    /// - "field_validator" -> FieldValidator (requires `field`)
    /// - "abort" -> Abort
    /// - "write_to_log" -> WriteToLog
    pub fn create_step(config: &StepConfig) -> Result<Box<dyn Step>, String> {
        match config.type_id.as_str() {
            "row_generator" => Ok(Box::new(RowGenerator::new(config.options_as()?)?)),
            "pass_through" => Ok(Box::new(PassThrough::new())),
            "prioritize_streams" => Ok(Box::new(PassThrough::prioritized())),
            "field_validator" => Ok(Box::new(FieldValidator::new(config.options_as()?))),
            "abort" => Ok(Box::new(Abort::new(config.options_as()?))),
            "write_to_log" => Ok(Box::new(WriteToLog)),
            other => Err(format!("Unknown built-in step type: '{}'", other)),
        }
    }

    /// List all built-in step types
    pub fn list_available_types() -> Vec<&'static str> {
        vec![
            "row_generator",
            "pass_through",
            "prioritize_streams",
            "field_validator",
            "abort",
            "write_to_log",
        ]
    }

    pub fn is_type_available(type_id: &str) -> bool {
        Self::list_available_types().contains(&type_id)
    }

    /// Register every built-in type with `registry`.
    pub fn register_all(registry: &mut StepRegistry) {
        for type_id in Self::list_available_types() {
            registry.register(type_id, Self::create_step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_type_can_be_created() {
        for type_id in BuiltinSteps::list_available_types() {
            let mut config = StepConfig::new("s", type_id);
            if type_id == "field_validator" {
                config = config.with_option("field", "amount");
            }
            let step = BuiltinSteps::create_step(&config)
                .unwrap_or_else(|e| panic!("failed to create {}: {}", type_id, e));
            assert_eq!(step.name(), type_id);
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = BuiltinSteps::create_step(&StepConfig::new("s", "teleport"))
            .err()
            .unwrap();
        assert!(err.contains("Unknown built-in step type"));
        assert!(!BuiltinSteps::is_type_available("teleport"));
        assert!(BuiltinSteps::is_type_available("abort"));
    }

    #[test]
    fn test_missing_required_option() {
        let err = BuiltinSteps::create_step(&StepConfig::new("check", "field_validator"))
            .err()
            .unwrap();
        assert!(err.contains("invalid options for step 'check'"), "{}", err);
    }

    #[test]
    fn test_register_all() {
        let mut registry = StepRegistry::new();
        BuiltinSteps::register_all(&mut registry);
        let mut expected = BuiltinSteps::list_available_types();
        expected.sort_unstable();
        assert_eq!(registry.type_ids(), expected);
    }
}

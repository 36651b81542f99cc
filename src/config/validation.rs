// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for step graph integrity.
//!
//! This module checks a [`GraphConfig`] before anything is instantiated, so a
//! malformed graph is rejected before a single step copy is created.
//!
//! # Validation Pipeline
//!
//! 1. **Option Validation**: Copies and buffer sizes are at least 1
//! 2. **Uniqueness Validation**: Ensures all step IDs are unique
//! 3. **Reference Validation**: Every hop endpoint and error target names a declared step,
//!    no hop is declared twice, and no error target doubles as a normal hop
//! 4. **Cycle Detection**: Uses DFS over main and error hops to find circular routes
//!
//! Cycle detection requires a valid graph structure, so it only runs once the
//! reference checks pass. Every other check accumulates, so users see all
//! issues at once.
//!
//! # Cycle Detection Algorithm
//! **Depth-First Search with a recursion stack**:
//! - **Time Complexity**: O(V + E) where V = steps, E = hops
//! - **Space Complexity**: O(V) for the visited set and recursion stack
//! - **Advantage**: Provides the actual cycle path for debugging
//!
//! # Example
//! ```rust
//! use rowflow::config::{validate_graph, GraphConfig, HopConfig, StepConfig};
//!
//! let config = GraphConfig {
//!     steps: vec![
//!         StepConfig::new("a", "pass_through"),
//!         StepConfig::new("b", "pass_through"),
//!     ],
//!     hops: vec![HopConfig::new("a", "b"), HopConfig::new("b", "a")],
//!     ..Default::default()
//! };
//!
//! let errors = validate_graph(&config).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use crate::config::{DistributionPolicy, GraphConfig};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CyclicHopDetected, DuplicateStepId, UnresolvedHop, ValidationCompleted, ValidationFailed,
    ValidationStarted,
};
use crate::observability::messages::StructuredLog;
use std::collections::{HashMap, HashSet};

/// Validate a graph configuration, returning every error found.
pub fn validate_graph(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    ValidationStarted {
        step_count: config.steps.len(),
        hop_count: config.hops.len(),
    }
    .log();

    let mut errors = Vec::new();

    if let Err(option_errors) = validate_options(config) {
        errors.extend(option_errors);
    }

    if let Err(duplicate_errors) = validate_unique_step_ids(config) {
        errors.extend(duplicate_errors);
    }

    if let Err(reference_errors) = validate_hop_references(config) {
        errors.extend(reference_errors);
    }

    // Cycle detection needs every hop to resolve
    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(config) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        ValidationCompleted {
            step_count: config.steps.len(),
            hop_count: config.hops.len(),
        }
        .log();
        Ok(())
    } else {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn validate_options(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.run.buffer_size == 0 {
        errors.push(ValidationError::InvalidBufferSize {
            location: "the run".to_string(),
        });
    }

    for step in &config.steps {
        if step.copies == 0 {
            errors.push(ValidationError::InvalidCopies {
                step_id: step.id.clone(),
            });
        }
        if let DistributionPolicy::Partition { field } = &step.distribution {
            if field.trim().is_empty() {
                errors.push(ValidationError::BlankPartitionField {
                    step_id: step.id.clone(),
                });
            }
        }
        if let Some(handling) = &step.error_handling {
            let options = [
                ("nr_errors_field", &handling.nr_errors_field),
                ("descriptions_field", &handling.descriptions_field),
                ("fields_field", &handling.fields_field),
                ("codes_field", &handling.codes_field),
            ];
            for (option, name) in options {
                if name.as_deref().is_some_and(|name| name.trim().is_empty()) {
                    errors.push(ValidationError::BlankErrorField {
                        step_id: step.id.clone(),
                        option: option.to_string(),
                    });
                }
            }
        }
    }

    for hop in &config.hops {
        if hop.buffer_size == Some(0) {
            errors.push(ValidationError::InvalidBufferSize {
                location: format!("hop '{}' -> '{}'", hop.from, hop.to),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_step_ids(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for step in &config.steps {
        if !seen_ids.insert(&step.id) {
            DuplicateStepId { step_id: &step.id }.log();
            errors.push(ValidationError::DuplicateStepId {
                step_id: step.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every hop endpoint and error target must name a declared step.
///
/// Also rejects a hop declared twice and an error target that is already a
/// normal hop of the same step, since the error rowsets would be
/// indistinguishable from the main ones.
fn validate_hop_references(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let step_ids: HashSet<&String> = config.steps.iter().map(|s| &s.id).collect();
    let mut declared_hops = HashSet::new();
    let mut errors = Vec::new();

    for hop in &config.hops {
        for endpoint in [&hop.from, &hop.to] {
            if !step_ids.contains(endpoint) {
                UnresolvedHop {
                    from: &hop.from,
                    to: &hop.to,
                    missing_step: endpoint,
                }
                .log();
                errors.push(ValidationError::UnresolvedHop {
                    from: hop.from.clone(),
                    to: hop.to.clone(),
                    missing_step: endpoint.clone(),
                });
            }
        }

        if !declared_hops.insert((&hop.from, &hop.to)) {
            errors.push(ValidationError::DuplicateHop {
                from: hop.from.clone(),
                to: hop.to.clone(),
            });
        }
    }

    for step in &config.steps {
        let Some(handling) = &step.error_handling else {
            continue;
        };
        if !step_ids.contains(&handling.target) {
            errors.push(ValidationError::UnresolvedErrorTarget {
                step_id: step.id.clone(),
                target: handling.target.clone(),
            });
        }
        if declared_hops.contains(&(&step.id, &handling.target)) {
            errors.push(ValidationError::ErrorTargetIsMainHop {
                step_id: step.id.clone(),
                target: handling.target.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates that main and error hops together form no cycle.
///
/// Uses the "three colors" DFS: a node is gray while on the recursion stack;
/// reaching a gray node again closes a cycle, whose path is extracted from the
/// current DFS path. Steps are visited in declaration order so the reported
/// cycle is deterministic.
fn validate_acyclic_graph(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let mut graph: HashMap<&str, Vec<&str>> = config
        .steps
        .iter()
        .map(|step| (step.id.as_str(), Vec::new()))
        .collect();

    for hop in &config.hops {
        if let Some(neighbors) = graph.get_mut(hop.from.as_str()) {
            neighbors.push(hop.to.as_str());
        }
    }
    for step in &config.steps {
        if let Some(handling) = &step.error_handling {
            if let Some(neighbors) = graph.get_mut(step.id.as_str()) {
                neighbors.push(handling.target.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for step in &config.steps {
        if !visited.contains(step.id.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(&step.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                let cycle_refs: Vec<&str> = cycle.iter().map(String::as_str).collect();
                CyclicHopDetected { cycle: &cycle_refs }.log();
                return Err(vec![ValidationError::CyclicHop { cycle }]);
            }
        }
    }

    Ok(())
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|&x| x == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[cycle_start..].iter().map(|s| s.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorHandling, HopConfig, StepConfig};

    fn graph(steps: &[&str], hops: &[(&str, &str)]) -> GraphConfig {
        GraphConfig {
            steps: steps.iter().map(|id| StepConfig::new(*id, "pass_through")).collect(),
            hops: hops.iter().map(|(from, to)| HopConfig::new(*from, *to)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_empty_config() {
        assert!(validate_graph(&graph(&[], &[])).is_ok());
    }

    #[test]
    fn test_valid_linear_chain() {
        assert!(validate_graph(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")])).is_ok());
    }

    #[test]
    fn test_valid_diamond() {
        let cfg = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        assert!(validate_graph(&cfg).is_ok());
    }

    #[test]
    fn test_duplicate_step_ids() {
        let errors = validate_graph(&graph(&["a", "a"], &[])).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateStepId { step_id: "a".to_string() }]
        );
    }

    #[test]
    fn test_unresolved_hop_endpoints() {
        let errors = validate_graph(&graph(&["a"], &[("a", "ghost"), ("phantom", "a")])).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::UnresolvedHop {
            from: "a".to_string(),
            to: "ghost".to_string(),
            missing_step: "ghost".to_string(),
        }));
    }

    #[test]
    fn test_duplicate_hop() {
        let errors = validate_graph(&graph(&["a", "b"], &[("a", "b"), ("a", "b")])).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateHop { from: "a".to_string(), to: "b".to_string() }]
        );
    }

    #[test]
    fn test_simple_cycle() {
        let errors = validate_graph(&graph(&["a", "b"], &[("a", "b"), ("b", "a")])).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicHop {
                cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()]
            }]
        );
    }

    #[test]
    fn test_self_loop() {
        let errors = validate_graph(&graph(&["a"], &[("a", "a")])).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::CyclicHop { cycle } if cycle.len() == 2));
    }

    #[test]
    fn test_complex_cycle_path() {
        let cfg = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "b")],
        );
        let errors = validate_graph(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicHop {
                cycle: vec!["b", "c", "d", "b"].into_iter().map(String::from).collect()
            }]
        );
    }

    #[test]
    fn test_error_hop_closes_cycle() {
        let mut cfg = graph(&["a", "b"], &[("a", "b")]);
        cfg.steps[1].error_handling = Some(ErrorHandling::new("a"));
        let errors = validate_graph(&cfg).unwrap_err();
        assert!(matches!(errors[0], ValidationError::CyclicHop { .. }));
    }

    #[test]
    fn test_error_target_checks() {
        let mut cfg = graph(&["a", "b"], &[("a", "b")]);
        cfg.steps[0].error_handling = Some(ErrorHandling::new("b"));
        cfg.steps[1].error_handling = Some(ErrorHandling::new("nowhere"));

        let errors = validate_graph(&cfg).unwrap_err();
        assert!(errors.contains(&ValidationError::ErrorTargetIsMainHop {
            step_id: "a".to_string(),
            target: "b".to_string(),
        }));
        assert!(errors.contains(&ValidationError::UnresolvedErrorTarget {
            step_id: "b".to_string(),
            target: "nowhere".to_string(),
        }));
    }

    #[test]
    fn test_zero_copies_and_buffers() {
        let mut cfg = graph(&["a", "b"], &[("a", "b")]);
        cfg.run.buffer_size = 0;
        cfg.steps[0].copies = 0;
        cfg.hops[0].buffer_size = Some(0);

        let errors = validate_graph(&cfg).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidCopies { step_id: "a".to_string() }));
    }

    #[test]
    fn test_blank_error_field_names() {
        let mut cfg = graph(&["a", "b"], &[]);
        cfg.steps[0].error_handling = Some(
            ErrorHandling::new("b")
                .with_descriptions_field("")
                .with_codes_field(" ")
                .with_fields_field("error_fields"),
        );

        let errors = validate_graph(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BlankErrorField {
                    step_id: "a".to_string(),
                    option: "descriptions_field".to_string(),
                },
                ValidationError::BlankErrorField {
                    step_id: "a".to_string(),
                    option: "codes_field".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_blank_partition_field() {
        let mut cfg = graph(&["a", "b"], &[("a", "b")]);
        cfg.steps[1].distribution = DistributionPolicy::Partition {
            field: String::new(),
        };

        let errors = validate_graph(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::BlankPartitionField { step_id: "b".to_string() }]
        );
    }

    #[test]
    fn test_multiple_errors_accumulate() {
        let errors = validate_graph(&graph(&["a", "a"], &[("a", "ghost")])).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}

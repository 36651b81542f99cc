// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during step graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A cycle was detected among the graph's hops (main and error hops)
    CyclicHop {
        /// The cycle path showing the circular route
        cycle: Vec<String>,
    },
    /// A hop references a step that doesn't exist
    UnresolvedHop {
        from: String,
        to: String,
        /// The endpoint that couldn't be resolved
        missing_step: String,
    },
    /// An error-handling target names a step that doesn't exist
    UnresolvedErrorTarget { step_id: String, target: String },
    /// A step has a duplicate ID
    DuplicateStepId { step_id: String },
    /// The same hop is declared more than once
    DuplicateHop { from: String, to: String },
    /// A step's error target is also one of its normal hops
    ErrorTargetIsMainHop { step_id: String, target: String },
    /// A step asks for zero copies
    InvalidCopies { step_id: String },
    /// A run-level or per-hop buffer size of zero
    InvalidBufferSize { location: String },
    /// An error-handling field option was given a blank field name
    BlankErrorField { step_id: String, option: String },
    /// A partitioned step names no partition field
    BlankPartitionField { step_id: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicHop { cycle } => {
                write!(f, "Cyclic hop detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedHop {
                from,
                to,
                missing_step,
            } => {
                write!(
                    f,
                    "Hop '{}' -> '{}' references step '{}' which does not exist",
                    from, to, missing_step
                )
            }
            ValidationError::UnresolvedErrorTarget { step_id, target } => {
                write!(
                    f,
                    "Step '{}' sends error rows to '{}' which does not exist",
                    step_id, target
                )
            }
            ValidationError::DuplicateStepId { step_id } => {
                write!(f, "Duplicate step ID: '{}'", step_id)
            }
            ValidationError::DuplicateHop { from, to } => {
                write!(f, "Hop '{}' -> '{}' is declared more than once", from, to)
            }
            ValidationError::ErrorTargetIsMainHop { step_id, target } => {
                write!(
                    f,
                    "Step '{}' uses '{}' both as a normal hop and as its error target",
                    step_id, target
                )
            }
            ValidationError::InvalidCopies { step_id } => {
                write!(f, "Step '{}' must run at least one copy", step_id)
            }
            ValidationError::InvalidBufferSize { location } => {
                write!(f, "Buffer size for {} must be at least 1", location)
            }
            ValidationError::BlankErrorField { step_id, option } => {
                write!(
                    f,
                    "Step '{}' sets error_handling.{} to a blank field name",
                    step_id, option
                )
            }
            ValidationError::BlankPartitionField { step_id } => {
                write!(f, "Step '{}' is partitioned but names no partition field", step_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

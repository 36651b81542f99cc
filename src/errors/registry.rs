// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for step instantiation through the step registry.

use std::error::Error;
use std::fmt;

/// Errors that can occur while creating step copies from configuration
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No factory is registered for the step type
    UnknownStepType { step_id: String, type_id: String },

    /// The factory rejected the step's configuration
    StepCreationFailed {
        step_id: String,
        type_id: String,
        reason: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownStepType { step_id, type_id } => {
                write!(
                    f,
                    "Step type '{}' used by step '{}' is not registered",
                    type_id, step_id
                )
            }
            RegistryError::StepCreationFailed {
                step_id,
                type_id,
                reason,
            } => {
                write!(
                    f,
                    "Failed to create {} step '{}': {}",
                    type_id, step_id, reason
                )
            }
        }
    }
}

impl Error for RegistryError {}

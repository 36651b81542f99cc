// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{RegistryError, SchemaError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a run winds down when stopped by an operator or by a failing step.
///
/// # Variants
/// * `Hard` - Abort every rowset at once; in-flight rows are discarded
/// * `Safe` - Stop reading at the sources and let everything downstream drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    #[default]
    Hard,
    Safe,
}

/// Errors raised by a rowset operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSetError {
    #[error("rowset {0} was aborted")]
    Aborted(String),

    #[error("rowset {0} is already marked done")]
    Closed(String),
}

/// Errors returned by step code and by the I/O primitives the runtime hands to it.
#[derive(Debug, Error)]
pub enum StepError {
    /// The run is being torn down; the step should return without doing more work.
    #[error("step was stopped")]
    Aborted,

    #[error("initialization failed: {0}")]
    Init(String),

    #[error("incompatible row layout: {0}")]
    Schema(#[from] SchemaError),

    /// A bad row with no error hop to send it to.
    #[error("data error with no error handling configured: {0}")]
    Data(String),

    #[error("{rejected} rows rejected after {read} read exceeds {limit}")]
    RejectionLimit {
        rejected: u64,
        read: u64,
        limit: String,
    },

    #[error("no rowset to step '{step}' copy {copy}")]
    UnknownTarget { step: String, copy: usize },

    #[error("{0}")]
    Failed(String),
}

impl StepError {
    /// Structural failures stem from the graph's shape rather than from row data.
    pub fn is_structural(&self) -> bool {
        matches!(self, StepError::Init(_) | StepError::Schema(_))
    }
}

impl From<RowSetError> for StepError {
    fn from(error: RowSetError) -> Self {
        match error {
            RowSetError::Aborted(_) => StepError::Aborted,
            closed @ RowSetError::Closed(_) => StepError::Failed(closed.to_string()),
        }
    }
}

/// Errors that keep a run from being launched or observed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph validation failed:\n{}", join_lines(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("incompatible layouts meet at step '{step_id}': {source}")]
    IncompatibleMerge {
        step_id: String,
        #[source]
        source: SchemaError,
    },

    #[error("internal engine failure: {0}")]
    Internal(String),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

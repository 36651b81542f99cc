// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::ValueType;
use thiserror::Error;

/// Layout errors: malformed schemas, rows that do not fit their schema, and
/// incompatible layouts meeting at a merge point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },

    #[error("row has {actual} values but its layout has {expected} fields")]
    RowLengthMismatch { expected: usize, actual: usize },

    #[error("field '{field}' at position {index} is {expected} but holds a {actual} value")]
    ValueTypeMismatch {
        index: usize,
        field: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("layouts have different field counts: {expected} vs {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },

    #[error("field {index} is named '{expected}' in one layout and '{actual}' in the other")]
    FieldNameMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("field '{field}' at position {index} is {expected} in one layout and {actual} in the other")]
    FieldTypeMismatch {
        index: usize,
        field: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    #[error("invalid {target} value: {reason}")]
    InvalidValue { target: ValueType, reason: String },
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-row error isolation.
//!
//! A step that finds a bad row hands it to [`StepIo::put_error`] together with
//! a [`RowError`]. When the step has an error hop, the row is extended with
//! the configured error fields and sent down that hop instead of the main
//! outputs, and the step keeps going. Rejection limits turn too many bad rows
//! back into a step failure.
//!
//! [`StepIo::put_error`]: crate::engine::StepIo::put_error

use crate::config::ErrorHandling;
use crate::engine::output::OutputHop;
use crate::errors::StepError;
use crate::model::{FieldDescriptor, Record, Row, SchemaRef, Value, ValueType};
use std::sync::Arc;

/// Why a row was rejected.
///
/// # Example
/// ```
/// use rowflow::engine::RowError;
///
/// let error = RowError::new("amount is not a number")
///     .with_field("amount")
///     .with_code("E_TYPE");
/// assert_eq!(error.nr_errors, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub description: String,
    pub fields: Vec<String>,
    pub code: Option<String>,
    pub nr_errors: u64,
}

impl RowError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            fields: Vec::new(),
            code: None,
            nr_errors: 1,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_nr_errors(mut self, nr_errors: u64) -> Self {
        self.nr_errors = nr_errors;
        self
    }
}

/// The values an error row can carry after the input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorValue {
    Count,
    Description,
    Fields,
    Code,
}

impl ErrorValue {
    fn value_type(self) -> ValueType {
        match self {
            ErrorValue::Count => ValueType::Integer,
            _ => ValueType::String,
        }
    }

    fn render(self, error: &RowError) -> Value {
        match self {
            ErrorValue::Count => Value::Integer(error.nr_errors as i64),
            ErrorValue::Description => Value::String(error.description.clone()),
            ErrorValue::Fields => Value::String(error.fields.join(",")),
            ErrorValue::Code => error.code.clone().map_or(Value::Null, Value::String),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ErrorRouter {
    handling: ErrorHandling,
    output: OutputHop,
    // Last (input layout, error layout) pair; rebuilt when the input layout changes
    layout: Option<(SchemaRef, SchemaRef)>,
}

impl ErrorRouter {
    pub(crate) fn new(handling: ErrorHandling, output: OutputHop) -> Self {
        Self {
            handling,
            output,
            layout: None,
        }
    }

    /// Error values in row order, skipping options left unset or blank.
    fn configured_fields(&self) -> impl Iterator<Item = (ErrorValue, &str)> + '_ {
        let handling = &self.handling;
        [
            (ErrorValue::Count, &handling.nr_errors_field),
            (ErrorValue::Description, &handling.descriptions_field),
            (ErrorValue::Fields, &handling.fields_field),
            (ErrorValue::Code, &handling.codes_field),
        ]
        .into_iter()
        .filter_map(|(value, name)| {
            name.as_deref()
                .filter(|name| !name.trim().is_empty())
                .map(|name| (value, name))
        })
    }

    /// Input row extended with the configured error fields.
    pub(crate) fn error_record(
        &mut self,
        record: Record,
        error: &RowError,
    ) -> Result<Record, StepError> {
        let schema = self.error_layout(&record.schema)?;
        let mut row: Row = record.row;
        row.extend(self.configured_fields().map(|(value, _)| value.render(error)));
        Ok(Record::new(schema, row))
    }

    /// Send an error record down the error hop. Returns the number of rowsets it was put to.
    pub(crate) async fn deliver(&mut self, record: Record) -> Result<u64, StepError> {
        self.output.deliver(record).await
    }

    /// Fail once the rejected rows exceed the configured limits.
    pub(crate) fn check_limits(&self, rejected: u64, read: u64) -> Result<(), StepError> {
        let handling = &self.handling;
        if handling.max_errors > 0 && rejected > handling.max_errors {
            return Err(StepError::RejectionLimit {
                rejected,
                read,
                limit: format!("max_errors {}", handling.max_errors),
            });
        }

        if handling.max_percent_errors > 0 && read >= handling.min_rows_for_percent {
            let percent = if read == 0 {
                100
            } else {
                (rejected * 100).div_ceil(read)
            };
            if percent > handling.max_percent_errors {
                return Err(StepError::RejectionLimit {
                    rejected,
                    read,
                    limit: format!("max_percent_errors {}%", handling.max_percent_errors),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn mark_done(&self) {
        self.output.mark_done();
    }

    fn error_layout(&mut self, input: &SchemaRef) -> Result<SchemaRef, StepError> {
        if let Some((key, layout)) = &self.layout {
            if Arc::ptr_eq(key, input) || **key == **input {
                return Ok(layout.clone());
            }
        }

        let extra: Vec<FieldDescriptor> = self
            .configured_fields()
            .map(|(value, name)| FieldDescriptor::new(name, value.value_type()))
            .collect();
        let layout = input.extend(extra)?.into_ref();
        self.layout = Some((input.clone(), layout.clone()));
        Ok(layout)
    }
}

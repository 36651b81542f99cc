// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::engine::StepIo;
use crate::errors::StepError;
use crate::model::{FieldDescriptor, Record, Row, RowSchema, SchemaRef, Value, ValueType};
use crate::traits::Step;

const DEFAULT_LIMIT: u64 = 10;
const DEFAULT_SEQUENCE_FIELD: &str = "n";

/// Options for the row generator.
///
/// # Fields
/// * `fields` - Layout of the literal rows
/// * `rows` - Literal rows, emitted in order and repeated until `limit` is reached
/// * `limit` - Rows to emit (default: the number of literal rows, or 10)
/// * `sequence_field` - Integer field prepended to every row, counting from 1
/// * `interval_ms` - Pause between rows
/// * `never_ending` - Ignore `limit` and emit until the run stops
///
/// Without `fields` and `sequence_field` the generator emits a single integer
/// sequence field named `n`.
///
/// # Example
/// ```yaml
/// type: row_generator
/// options:
///   sequence_field: id
///   fields:
///     - { name: amount, type: integer }
///     - { name: label, type: string }
///   rows:
///     - [10, "ten"]
///     - [20, "twenty"]
///   limit: 1000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RowGeneratorOptions {
    pub fields: Vec<FieldDescriptor>,
    pub rows: Vec<Vec<serde_yaml::Value>>,
    pub limit: Option<u64>,
    pub sequence_field: Option<String>,
    pub interval_ms: u64,
    pub never_ending: bool,
}

/// Source step emitting literal rows and/or an integer sequence.
pub struct RowGenerator {
    schema: SchemaRef,
    rows: Vec<Vec<Value>>,
    sequence: bool,
    limit: u64,
    interval: Duration,
    never_ending: bool,
    emitted: u64,
}

impl RowGenerator {
    pub fn new(options: RowGeneratorOptions) -> Result<Self, String> {
        let sequence_field = match (&options.sequence_field, options.fields.is_empty()) {
            (Some(name), _) => Some(name.clone()),
            (None, true) => Some(DEFAULT_SEQUENCE_FIELD.to_string()),
            (None, false) => None,
        };

        let mut fields = Vec::with_capacity(options.fields.len() + 1);
        if let Some(name) = &sequence_field {
            fields.push(FieldDescriptor::new(name.clone(), ValueType::Integer));
        }
        fields.extend(options.fields.iter().cloned());
        let schema = RowSchema::new(fields).map_err(|e| e.to_string())?.into_ref();

        let rows = options
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                literal_row(&options.fields, row).map_err(|e| format!("row {}: {}", index + 1, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let default_limit = if rows.is_empty() { DEFAULT_LIMIT } else { rows.len() as u64 };

        Ok(Self {
            schema,
            rows,
            sequence: sequence_field.is_some(),
            limit: options.limit.unwrap_or(default_limit),
            interval: Duration::from_millis(options.interval_ms),
            never_ending: options.never_ending,
            emitted: 0,
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn next_row(&self) -> Row {
        let mut values = Vec::with_capacity(self.schema.len());
        if self.sequence {
            values.push(Value::Integer(self.emitted as i64 + 1));
        }
        if self.rows.is_empty() {
            values.resize(self.schema.len(), Value::Null);
        } else {
            let literal = &self.rows[(self.emitted % self.rows.len() as u64) as usize];
            values.extend(literal.iter().cloned());
        }
        Row::new(values)
    }
}

fn literal_row(fields: &[FieldDescriptor], row: &[serde_yaml::Value]) -> Result<Vec<Value>, String> {
    if row.len() != fields.len() {
        return Err(format!("expected {} values, found {}", fields.len(), row.len()));
    }
    fields
        .iter()
        .zip(row)
        .map(|(field, value)| {
            Value::from_yaml(value, field.value_type)
                .map_err(|e| format!("field '{}': {}", field.name, e))
        })
        .collect()
}

#[async_trait]
impl Step for RowGenerator {
    fn name(&self) -> &'static str {
        "row_generator"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        if !self.never_ending && self.emitted >= self.limit {
            return Ok(false);
        }

        let record = Record::new(self.schema.clone(), self.next_row());
        io.put_row(record).await?;
        self.emitted += 1;

        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        Ok(true)
    }

    fn output_schema(&self, _inputs: &[SchemaRef]) -> Option<SchemaRef> {
        Some(self.schema.clone())
    }
}

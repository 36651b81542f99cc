// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SchemaError;
use crate::model::{FieldDescriptor, Row};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable row layout.
pub type SchemaRef = Arc<RowSchema>;

/// Ordered list of field descriptors describing every row that references it.
///
/// Field names are unique within a schema, compared case-insensitively. A schema never
/// changes after construction; steps that add or drop fields build a new one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RowSchema {
    fields: Vec<FieldDescriptor>,
}

impl RowSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.to_lowercase()) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the named field, ignoring case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// New schema with `extra` appended after the existing fields.
    pub fn extend<I>(&self, extra: I) -> Result<RowSchema, SchemaError>
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        let mut fields = self.fields.clone();
        fields.extend(extra);
        RowSchema::new(fields)
    }

    /// Check that `row` has one value per field and every value fits its field type.
    pub fn validate_row(&self, row: &Row) -> Result<(), SchemaError> {
        if row.len() != self.fields.len() {
            return Err(SchemaError::RowLengthMismatch {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }

        for (index, (field, value)) in self.fields.iter().zip(row.values()).enumerate() {
            if !value.conforms_to(field.value_type) {
                return Err(SchemaError::ValueTypeMismatch {
                    index,
                    field: field.name.clone(),
                    expected: field.value_type,
                    // conforms_to only fails for non-null values
                    actual: value.value_type().unwrap_or(field.value_type),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for RowSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        write!(f, "[{}]", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Value, ValueType};

    fn people() -> RowSchema {
        RowSchema::new(vec![
            FieldDescriptor::new("id", ValueType::Integer),
            FieldDescriptor::new("name", ValueType::String).with_length(40),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected_ignoring_case() {
        let result = RowSchema::new(vec![
            FieldDescriptor::new("Name", ValueType::String),
            FieldDescriptor::new("NAME", ValueType::String),
        ]);
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DuplicateField { name: "NAME".to_string() }
        );
    }

    #[test]
    fn test_index_of_ignores_case() {
        let schema = people();
        assert_eq!(schema.index_of("ID"), Some(0));
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
    }

    #[test]
    fn test_extend_appends_and_keeps_original() {
        let schema = people();
        let extended = schema
            .extend(vec![FieldDescriptor::new("error_code", ValueType::String)])
            .unwrap();
        assert_eq!(extended.field_names(), vec!["id", "name", "error_code"]);
        assert_eq!(schema.len(), 2);
        assert!(schema.extend(vec![FieldDescriptor::new("Id", ValueType::String)]).is_err());
    }

    #[test]
    fn test_validate_row() {
        let schema = people();
        assert!(schema.validate_row(&Row::from(vec![Value::Integer(1), Value::from("ann")])).is_ok());
        assert!(schema.validate_row(&Row::from(vec![Value::Null, Value::Null])).is_ok());

        let short = schema.validate_row(&Row::from(vec![Value::Integer(1)]));
        assert_eq!(
            short.unwrap_err(),
            SchemaError::RowLengthMismatch { expected: 2, actual: 1 }
        );

        let wrong = schema.validate_row(&Row::from(vec![Value::from("1"), Value::from("ann")]));
        assert!(matches!(
            wrong.unwrap_err(),
            SchemaError::ValueTypeMismatch { index: 0, expected: ValueType::Integer, actual: ValueType::String, .. }
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(people().to_string(), "[id:integer, name:string(40)]");
    }
}

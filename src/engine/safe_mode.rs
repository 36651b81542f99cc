// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Layout compatibility at merge points.
//!
//! Two layouts may be mixed on one step's input when they have the same
//! number of fields and, position by position, the names match ignoring case
//! and the types are equal or the second widens into the first
//! (integer to float, integer to decimal).

use crate::errors::SchemaError;
use crate::model::RowSchema;

/// Check that rows laid out as `candidate` may be mixed with rows laid out as `reference`.
pub fn check_compatible(reference: &RowSchema, candidate: &RowSchema) -> Result<(), SchemaError> {
    if reference.len() != candidate.len() {
        return Err(SchemaError::FieldCountMismatch {
            expected: reference.len(),
            actual: candidate.len(),
        });
    }

    for (index, (expected, actual)) in reference
        .fields()
        .iter()
        .zip(candidate.fields())
        .enumerate()
    {
        if !expected.name.eq_ignore_ascii_case(&actual.name) {
            return Err(SchemaError::FieldNameMismatch {
                index,
                expected: expected.name.clone(),
                actual: actual.name.clone(),
            });
        }
        if !actual.value_type.widens_to(expected.value_type) {
            return Err(SchemaError::FieldTypeMismatch {
                index,
                field: expected.name.clone(),
                expected: expected.value_type,
                actual: actual.value_type,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, ValueType};

    fn schema(fields: &[(&str, ValueType)]) -> RowSchema {
        RowSchema::new(
            fields
                .iter()
                .map(|(name, ty)| FieldDescriptor::new(*name, *ty))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_layouts_are_compatible_both_ways() {
        let a = schema(&[("id", ValueType::Integer), ("name", ValueType::String)]);
        let b = a.clone();
        assert!(check_compatible(&a, &b).is_ok());
        assert!(check_compatible(&b, &a).is_ok());
    }

    #[test]
    fn test_names_compare_ignoring_case() {
        let a = schema(&[("ID", ValueType::Integer)]);
        let b = schema(&[("id", ValueType::Integer)]);
        assert!(check_compatible(&a, &b).is_ok());
    }

    #[test]
    fn test_mismatches() {
        let reference = schema(&[("id", ValueType::Integer), ("amount", ValueType::Float)]);

        let fewer = schema(&[("id", ValueType::Integer)]);
        assert!(matches!(
            check_compatible(&reference, &fewer),
            Err(SchemaError::FieldCountMismatch { expected: 2, actual: 1 })
        ));

        let renamed = schema(&[("id", ValueType::Integer), ("total", ValueType::Float)]);
        assert!(matches!(
            check_compatible(&reference, &renamed),
            Err(SchemaError::FieldNameMismatch { index: 1, .. })
        ));

        let retyped = schema(&[("id", ValueType::String), ("amount", ValueType::Float)]);
        assert!(matches!(
            check_compatible(&reference, &retyped),
            Err(SchemaError::FieldTypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_integer_widens_into_float_but_not_back() {
        let floats = schema(&[("amount", ValueType::Float)]);
        let integers = schema(&[("amount", ValueType::Integer)]);
        assert!(check_compatible(&floats, &integers).is_ok());
        assert!(check_compatible(&integers, &floats).is_err());
    }

    #[test]
    fn test_empty_layouts_are_compatible() {
        assert!(check_compatible(&RowSchema::empty(), &RowSchema::empty()).is_ok());
    }
}

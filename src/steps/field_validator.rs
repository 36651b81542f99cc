// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;

use crate::engine::{RowError, StepIo};
use crate::errors::StepError;
use crate::model::{Value, ValueType};
use crate::traits::Step;

/// Options for the field validator.
///
/// # Example
/// ```yaml
/// type: field_validator
/// error_handling: { target: rejects }
/// options:
///   field: amount
///   expect: integer
///   not_null: true
///   error_code: E_AMOUNT
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValidatorOptions {
    pub field: String,
    #[serde(default)]
    pub expect: Option<ValueType>,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Passes rows whose field checks out and diverts the rest to the error hop.
///
/// A string value satisfies `expect` when it parses as the expected type.
/// Without an error hop the first bad row fails the step.
pub struct FieldValidator {
    options: FieldValidatorOptions,
}

impl FieldValidator {
    pub fn new(options: FieldValidatorOptions) -> Self {
        Self { options }
    }

    fn check(&self, value: &Value) -> Option<String> {
        let field = &self.options.field;
        if value.is_null() {
            return self
                .options
                .not_null
                .then(|| format!("field '{}' is null", field));
        }

        let expected = self.options.expect?;
        if value.conforms_to(expected) || parses_as(value, expected) {
            return None;
        }
        Some(format!(
            "field '{}' value '{}' is not a valid {}",
            field, value, expected
        ))
    }
}

fn parses_as(value: &Value, expected: ValueType) -> bool {
    let Some(text) = value.as_str() else {
        return false;
    };
    Value::from_yaml(&serde_yaml::Value::String(text.trim().to_string()), expected).is_ok()
}

#[async_trait]
impl Step for FieldValidator {
    fn name(&self) -> &'static str {
        "field_validator"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        let Some(record) = io.get_row().await? else {
            return Ok(false);
        };

        let value = record.get(&self.options.field).ok_or_else(|| {
            StepError::Failed(format!(
                "field '{}' is not part of the input layout {}",
                self.options.field, record.schema
            ))
        })?;

        match self.check(value) {
            None => io.put_row(record).await?,
            Some(description) => {
                let mut error = RowError::new(description).with_field(self.options.field.clone());
                if let Some(code) = &self.options.error_code {
                    error = error.with_code(code.clone());
                }
                io.put_error(record, error).await?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(expect: Option<ValueType>, not_null: bool) -> FieldValidator {
        FieldValidator::new(FieldValidatorOptions {
            field: "amount".to_string(),
            expect,
            not_null,
            error_code: None,
        })
    }

    #[test]
    fn test_type_check() {
        let v = validator(Some(ValueType::Integer), false);
        assert!(v.check(&Value::Integer(3)).is_none());
        assert!(v.check(&Value::from("42")).is_none());
        let problem = v.check(&Value::from("abc")).unwrap();
        assert!(problem.contains("is not a valid integer"), "{}", problem);
    }

    #[test]
    fn test_null_handling() {
        assert!(validator(Some(ValueType::Integer), false)
            .check(&Value::Null)
            .is_none());
        assert_eq!(
            validator(None, true).check(&Value::Null),
            Some("field 'amount' is null".to_string())
        );
    }

    #[test]
    fn test_options_deserialize() {
        let options: FieldValidatorOptions =
            serde_yaml::from_str("field: amount\nexpect: decimal\nerror_code: E1").unwrap();
        assert_eq!(options.expect, Some(ValueType::Decimal));
        assert!(!options.not_null);
        assert_eq!(options.error_code.as_deref(), Some("E1"));
    }
}

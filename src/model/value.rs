// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SchemaError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Logical type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Binary,
}

impl ValueType {
    /// True when a value of this type can stand in for `target` without loss of meaning.
    ///
    /// Integers widen to floats and decimals; every other type only matches itself.
    pub fn widens_to(self, target: ValueType) -> bool {
        self == target
            || matches!(
                (self, target),
                (ValueType::Integer, ValueType::Float) | (ValueType::Integer, ValueType::Decimal)
            )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// Exact fixed-point number: `units * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    units: i128,
    scale: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal '{0}'")]
pub struct ParseDecimalError(String);

impl Decimal {
    pub fn new(units: i128, scale: u32) -> Self {
        Self { units, scale }
    }

    pub fn units(&self) -> i128 {
        self.units
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value as i128, 0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{}{}", whole, fraction);
        let magnitude: i128 = digits.parse().map_err(|_| invalid())?;
        let units = if negative { -magnitude } else { magnitude };
        Ok(Self::new(units, fraction.len() as u32))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        if self.scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let scale = self.scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, whole, fraction)
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDateTime),
    Binary(Vec<u8>),
}

impl Value {
    /// Type of the value; `None` for `Null`, which fits every field.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(ValueType::String),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::Decimal(_) => Some(ValueType::Decimal),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Date(_) => Some(ValueType::Date),
            Value::Binary(_) => Some(ValueType::Binary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True when the value may be stored in a field declared as `value_type`.
    pub fn conforms_to(&self, value_type: ValueType) -> bool {
        self.value_type()
            .map_or(true, |actual| actual.widens_to(value_type))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert a YAML scalar from a graph file into a value of the requested type.
    pub fn from_yaml(value: &serde_yaml::Value, target: ValueType) -> Result<Value, SchemaError> {
        use serde_yaml::Value as Yaml;

        let invalid = |reason: &str| SchemaError::InvalidValue {
            target,
            reason: reason.to_string(),
        };

        let text = match value {
            Yaml::Null => return Ok(Value::Null),
            Yaml::String(s) => s.clone(),
            Yaml::Number(n) => n.to_string(),
            Yaml::Bool(b) => b.to_string(),
            _ => return Err(invalid("expected a scalar")),
        };

        match (target, value) {
            (ValueType::String, _) => Ok(Value::String(text)),
            (ValueType::Integer, _) => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| invalid(&e.to_string())),
            (ValueType::Float, _) => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| invalid(&e.to_string())),
            (ValueType::Decimal, _) => text
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|e| invalid(&e.to_string())),
            (ValueType::Boolean, Yaml::Bool(b)) => Ok(Value::Boolean(*b)),
            (ValueType::Boolean, _) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "y" | "yes" => Ok(Value::Boolean(true)),
                "false" | "n" | "no" => Ok(Value::Boolean(false)),
                _ => Err(invalid("expected true or false")),
            },
            (ValueType::Date, _) => parse_date(&text)
                .map(Value::Date)
                .ok_or_else(|| invalid("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")),
            (ValueType::Binary, _) => STANDARD
                .decode(text.trim())
                .map(Value::Binary)
                .map_err(|e| invalid(&e.to_string())),
        }
    }
}

/// Parse the date formats accepted in graph files.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format(DATE_TIME_FORMATS[0])),
            Value::Binary(bytes) => f.write_str(&STANDARD.encode(bytes)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widens_to_float_and_decimal_only() {
        assert!(ValueType::Integer.widens_to(ValueType::Float));
        assert!(ValueType::Integer.widens_to(ValueType::Decimal));
        assert!(ValueType::Integer.widens_to(ValueType::Integer));
        assert!(!ValueType::Float.widens_to(ValueType::Integer));
        assert!(!ValueType::String.widens_to(ValueType::Integer));
        assert!(!ValueType::Date.widens_to(ValueType::String));
    }

    #[test]
    fn test_decimal_parse_and_display() {
        let cases = vec![
            ("12.34", 1234, 2, "12.34"),
            ("-0.05", -5, 2, "-0.05"),
            ("42", 42, 0, "42"),
            ("+7.0", 70, 1, "7.0"),
            (".5", 5, 1, "0.5"),
        ];

        for (input, units, scale, display) in cases {
            let parsed: Decimal = input.parse().unwrap();
            assert_eq!(parsed.units(), units, "units for {}", input);
            assert_eq!(parsed.scale(), scale, "scale for {}", input);
            assert_eq!(parsed.to_string(), display, "display for {}", input);
        }
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        for input in ["", ".", "1.2.3", "abc", "1e5", "--1"] {
            assert!(input.parse::<Decimal>().is_err(), "'{}' should not parse", input);
        }
    }

    #[test]
    fn test_null_conforms_to_every_type() {
        assert!(Value::Null.conforms_to(ValueType::Date));
        assert!(Value::Integer(3).conforms_to(ValueType::Float));
        assert!(!Value::from("x").conforms_to(ValueType::Integer));
    }

    #[test]
    fn test_from_yaml_conversions() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[42, '17', 2.5, true, '2024-03-01', 'aGk=', null]").unwrap();
        let items = yaml.as_sequence().unwrap();

        assert_eq!(Value::from_yaml(&items[0], ValueType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(Value::from_yaml(&items[1], ValueType::Integer).unwrap(), Value::Integer(17));
        assert_eq!(Value::from_yaml(&items[2], ValueType::Float).unwrap(), Value::Float(2.5));
        assert_eq!(
            Value::from_yaml(&items[2], ValueType::Decimal).unwrap(),
            Value::Decimal(Decimal::new(25, 1))
        );
        assert_eq!(Value::from_yaml(&items[3], ValueType::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(
            Value::from_yaml(&items[4], ValueType::Date).unwrap().to_string(),
            "2024-03-01 00:00:00"
        );
        assert_eq!(
            Value::from_yaml(&items[5], ValueType::Binary).unwrap(),
            Value::Binary(b"hi".to_vec())
        );
        assert_eq!(Value::from_yaml(&items[6], ValueType::String).unwrap(), Value::Null);
        assert_eq!(Value::from_yaml(&items[0], ValueType::String).unwrap(), Value::from("42"));
    }

    #[test]
    fn test_from_yaml_reports_target_type() {
        let yaml = serde_yaml::Value::String("not a number".to_string());
        let err = Value::from_yaml(&yaml, ValueType::Integer).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { target: ValueType::Integer, .. }));
    }

    #[test]
    fn test_binary_displays_as_base64() {
        assert_eq!(Value::Binary(b"rowflow".to_vec()).to_string(), "cm93Zmxvdw==");
    }
}

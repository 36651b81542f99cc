// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{SchemaRef, Value};
use std::fmt;

/// Positional list of values; position `i` is described by field `i` of the row's schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Replace the value at `index`, returning the old one. `None` if out of range.
    pub fn set(&mut self, index: usize, value: Value) -> Option<Value> {
        self.0
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Value> for Row {
    fn extend<T: IntoIterator<Item = Value>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.0.iter().map(|value| value.to_string()).collect();
        f.write_str(&values.join(", "))
    }
}

/// A row together with the schema that describes it; the unit moved through rowsets.
#[derive(Debug, Clone)]
pub struct Record {
    pub schema: SchemaRef,
    pub row: Row,
}

impl Record {
    pub fn new(schema: SchemaRef, row: Row) -> Self {
        Self { schema, row }
    }

    /// Value of the named field, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .index_of(name)
            .and_then(|index| self.row.get(index))
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Record and schema model.
//!
//! Rows are positional value vectors. The meaning of each position comes from the
//! [`RowSchema`] travelling with the row; schemas are immutable once built and are
//! shared between every row that uses them through [`SchemaRef`].

mod field;
mod row;
mod schema;
mod value;

pub use field::FieldDescriptor;
pub use row::{Record, Row};
pub use schema::{RowSchema, SchemaRef};
pub use value::{Decimal, ParseDecimalError, Value, ValueType};

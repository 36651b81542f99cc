// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod abort;
pub mod factory;
pub mod field_validator;
pub mod pass_through;
pub mod row_generator;
pub mod write_to_log;
#[cfg(test)]
pub mod stub;

pub use abort::*;
pub use factory::BuiltinSteps;
pub use field_validator::*;
pub use pass_through::*;
pub use row_generator::*;
pub use write_to_log::*;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod registry;
mod schema;

pub use config::ValidationError;
pub use execution::{EngineError, RowSetError, StepError, StopMode};
pub use registry::RegistryError;
pub use schema::SchemaError;

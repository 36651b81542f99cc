// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // graph config + step registry
pub mod engine;     // rowsets, step runtime, launcher
pub mod errors;     // error handling
pub mod model;      // records and schemas
pub mod observability;
pub mod steps;      // built-in steps
pub mod traits;     // step + listener abstractions

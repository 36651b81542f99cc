// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod graph;
mod loader;
mod registry;
mod runtime;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use graph::{Hop, HopKind, StepGraph, StepGraphBuilder};
pub use loader::{
    load_and_validate_config, load_config, DistributionPolicy, ErrorHandling, GraphConfig,
    HopConfig, MergePolicy, RunOptions, StepConfig,
};
pub use registry::{StepFactory, StepRegistry};
pub use runtime::RuntimeBuilder;
pub use validation::validate_graph;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod listener;
pub mod step;

pub use listener::RowListener;
pub use step::{Step, StepContext};

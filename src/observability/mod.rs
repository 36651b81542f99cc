// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout rowflow. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the text and structured output
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - Run lifecycle, topology and stop/pause events
//! * `messages::step` - Step copy lifecycle, checkpoints and rejected rows
//! * `messages::validation` - Graph validation warnings and errors
//!
//! # Usage
//!
//! ```rust
//! use rowflow::observability::messages::step::StepInitialized;
//! use rowflow::observability::messages::StructuredLog;
//!
//! let msg = StepInitialized {
//!     step_id: "read_orders",
//!     copy_nr: 0,
//! };
//!
//! msg.log();
//! ```

pub mod messages;

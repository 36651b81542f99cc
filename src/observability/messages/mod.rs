// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with structured fields at its
//! natural level.
//!
//! # Organization
//!
//! * `engine` - Run lifecycle, topology and stop/pause events
//! * `step` - Step copy lifecycle, checkpoints and rejected rows
//! * `validation` - Graph validation warnings and errors

use tracing::Span;

pub mod engine;
pub mod step;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}

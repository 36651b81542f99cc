// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for step copy lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Step initialization and disposal
//! * Terminal states and final counters
//! * Periodic progress checkpoints
//! * Rows diverted to an error hop
//! * Rows echoed by the `write_to_log` step

use crate::engine::StepState;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Step copy finished `init` successfully.
///
/// # Log Level
/// `debug!` - Lifecycle detail
///
/// # Example
/// ```
/// use rowflow::observability::messages::step::StepInitialized;
///
/// let msg = StepInitialized {
///     step_id: "read_orders",
///     copy_nr: 0,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StepInitialized<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
}

impl Display for StepInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' copy {} initialized", self.step_id, self.copy_nr)
    }
}

impl StructuredLog for StepInitialized<'_> {
    fn log(&self) {
        tracing::debug!(step_id = self.step_id, copy_nr = self.copy_nr, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
        )
    }
}

/// Step copy failed during `init`.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use rowflow::observability::messages::step::StepInitFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "lookup table missing");
/// let msg = StepInitFailed {
///     step_id: "enrich",
///     copy_nr: 2,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StepInitFailed<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepInitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} failed to initialize: {}",
            self.step_id, self.copy_nr, self.error
        )
    }
}

impl StructuredLog for StepInitFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_init_failed",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = %self.error,
        )
    }
}

/// Step copy raised an error while processing rows.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StepFailed<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} failed: {}",
            self.step_id, self.copy_nr, self.error
        )
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_failed",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = %self.error,
        )
    }
}

/// Step copy task panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StepPanicked<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub message: &'a str,
}

impl Display for StepPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} panicked: {}",
            self.step_id, self.copy_nr, self.message
        )
    }
}

impl StructuredLog for StepPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            panic = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_panicked",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
        )
    }
}

/// Step copy reached a terminal state.
///
/// # Log Level
/// `info!` - Operational event with final counters
pub struct StepFinished<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub state: StepState,
    pub lines_read: u64,
    pub lines_written: u64,
    pub lines_rejected: u64,
}

impl Display for StepFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} {}: read={} written={} rejected={}",
            self.step_id,
            self.copy_nr,
            self.state,
            self.lines_read,
            self.lines_written,
            self.lines_rejected
        )
    }
}

impl StructuredLog for StepFinished<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            state = %self.state,
            lines_read = self.lines_read,
            lines_written = self.lines_written,
            lines_rejected = self.lines_rejected,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_finished",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            state = %self.state,
        )
    }
}

/// Periodic progress report, every `checkpoint_interval` rows.
///
/// # Log Level
/// `info!` - Progress feedback
///
/// # Example
/// ```
/// use rowflow::observability::messages::step::StepCheckpoint;
///
/// let msg = StepCheckpoint {
///     step_id: "load_customers",
///     copy_nr: 0,
///     lines_read: 50_000,
///     lines_written: 49_990,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct StepCheckpoint<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub lines_read: u64,
    pub lines_written: u64,
}

impl Display for StepCheckpoint<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} progress: read={} written={}",
            self.step_id, self.copy_nr, self.lines_read, self.lines_written
        )
    }
}

impl StructuredLog for StepCheckpoint<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            lines_read = self.lines_read,
            lines_written = self.lines_written,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "checkpoint",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
        )
    }
}

/// A row was diverted to the step's error hop.
///
/// # Log Level
/// `debug!` - Per-row detail
pub struct RowRejected<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub description: &'a str,
}

impl Display for RowRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' copy {} rejected a row: {}",
            self.step_id, self.copy_nr, self.description
        )
    }
}

impl StructuredLog for RowRejected<'_> {
    fn log(&self) {
        tracing::debug!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            description = self.description,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "row_rejected",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
        )
    }
}

/// A row echoed by the `write_to_log` step.
///
/// # Log Level
/// `info!` - The step exists to make rows visible
pub struct RowLogged<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub fields: &'a str,
    pub values: &'a str,
}

impl Display for RowLogged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} = {}", self.fields, self.values)
    }
}

impl StructuredLog for RowLogged<'_> {
    fn log(&self) {
        tracing::info!(step_id = self.step_id, copy_nr = self.copy_nr, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "row",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
        )
    }
}

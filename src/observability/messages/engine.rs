// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Topology construction (rowsets allocated per hop)
//! * Run start, completion and failure
//! * Operator stop, pause and resume requests

use crate::errors::StopMode;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Rowsets have been allocated for every hop.
///
/// # Log Level
/// `debug!` - Build detail
///
/// # Example
/// ```
/// use rowflow::observability::messages::engine::TopologyBuilt;
///
/// let msg = TopologyBuilt {
///     step_count: 3,
///     copy_count: 5,
///     rowset_count: 6,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TopologyBuilt {
    pub step_count: usize,
    pub copy_count: usize,
    pub rowset_count: usize,
}

impl Display for TopologyBuilt {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Built topology: {} steps, {} step copies, {} rowsets",
            self.step_count, self.copy_count, self.rowset_count
        )
    }
}

impl StructuredLog for TopologyBuilt {
    fn log(&self) {
        tracing::debug!(
            step_count = self.step_count,
            copy_count = self.copy_count,
            rowset_count = self.rowset_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "topology",
            span_name = name,
            step_count = self.step_count,
            copy_count = self.copy_count,
            rowset_count = self.rowset_count,
        )
    }
}

/// Every step copy initialized and rows are about to flow.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use rowflow::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     step_count: 4,
///     copy_count: 7,
///     buffer_size: 10_000,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub step_count: usize,
    pub copy_count: usize,
    pub buffer_size: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run: {} steps in {} copies, buffer_size={}",
            self.step_count, self.copy_count, self.buffer_size
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            copy_count = self.copy_count,
            buffer_size = self.buffer_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            step_count = self.step_count,
            copy_count = self.copy_count,
            buffer_size = self.buffer_size,
        )
    }
}

/// Run finished without a failing step.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted {
    pub step_count: usize,
    pub rows_written: u64,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run completed: {} steps wrote {} rows in {:?}",
            self.step_count, self.rows_written, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            rows_written = self.rows_written,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            step_count = self.step_count,
            rows_written = self.rows_written,
            duration = ?self.duration,
        )
    }
}

/// Run terminated early because a step copy failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use rowflow::observability::messages::engine::RunFailed;
///
/// let msg = RunFailed {
///     step_id: "parse_amounts",
///     copy_nr: 1,
///     message: "too many rejected rows",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct RunFailed<'a> {
    pub step_id: &'a str,
    pub copy_nr: usize,
    pub message: &'a str,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run failed in step '{}' copy {}: {}",
            self.step_id, self.copy_nr, self.message
        )
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            step_id = self.step_id,
            copy_nr = self.copy_nr,
            error = self.message,
        )
    }
}

/// At least one step copy failed to initialize; no rows were processed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct LaunchAborted {
    pub failed_inits: usize,
    pub copy_count: usize,
}

impl Display for LaunchAborted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Launch aborted: {} of {} step copies failed to initialize",
            self.failed_inits, self.copy_count
        )
    }
}

impl StructuredLog for LaunchAborted {
    fn log(&self) {
        tracing::error!(
            failed_inits = self.failed_inits,
            copy_count = self.copy_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "launch_aborted",
            span_name = name,
            failed_inits = self.failed_inits,
            copy_count = self.copy_count,
        )
    }
}

/// A stop was requested, by an operator or by the failure policy.
///
/// # Log Level
/// `warn!` - Run is ending early
pub struct StopRequested<'a> {
    pub mode: StopMode,
    pub reason: &'a str,
}

impl Display for StopRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:?} stop requested: {}", self.mode, self.reason)
    }
}

impl StructuredLog for StopRequested<'_> {
    fn log(&self) {
        tracing::warn!(mode = ?self.mode, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stop_requested",
            span_name = name,
            mode = ?self.mode,
            reason = self.reason,
        )
    }
}

/// The run was paused or resumed.
///
/// # Log Level
/// `info!` - Operator action
pub struct PauseStateChanged {
    pub paused: bool,
}

impl Display for PauseStateChanged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.paused {
            write!(f, "Run paused")
        } else {
            write!(f, "Run resumed")
        }
    }
}

impl StructuredLog for PauseStateChanged {
    fn log(&self) {
        tracing::info!(paused = self.paused, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pause", span_name = name, paused = self.paused)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Step states, live counters and the final run result.

use crate::errors::StopMode;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

/// Lifecycle of one step copy.
///
/// `Created → Initialized → Running → {Done | Stopped | Errored}`; a launch
/// aborted during initialization goes straight to `Stopped` or `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Created,
    Initialized,
    Running,
    Done,
    Stopped,
    Errored,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Done | StepState::Stopped | StepState::Errored)
    }

    // Ranking used to summarize the copies of one step: the worst state wins.
    fn severity(self) -> u8 {
        match self {
            StepState::Done => 0,
            StepState::Created => 1,
            StepState::Initialized => 2,
            StepState::Running => 3,
            StepState::Stopped => 4,
            StepState::Errored => 5,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => StepState::Created,
            1 => StepState::Initialized,
            2 => StepState::Running,
            3 => StepState::Done,
            4 => StepState::Stopped,
            _ => StepState::Errored,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            StepState::Created => 0,
            StepState::Initialized => 1,
            StepState::Running => 2,
            StepState::Done => 3,
            StepState::Stopped => 4,
            StepState::Errored => 5,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepState::Created => "created",
            StepState::Initialized => "initialized",
            StepState::Running => "running",
            StepState::Done => "done",
            StepState::Stopped => "stopped",
            StepState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Row counters of one step copy.
///
/// Only the copy's own task increments them; the launcher reads them for
/// status snapshots while the run is in flight.
#[derive(Debug, Default)]
pub struct StepCounters {
    lines_read: AtomicU64,
    lines_written: AtomicU64,
    lines_rejected: AtomicU64,
    errors: AtomicU64,
}

impl StepCounters {
    /// Add `n` rows read, returning the new total.
    pub fn add_read(&self, n: u64) -> u64 {
        self.lines_read.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_written(&self, n: u64) -> u64 {
        self.lines_written.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_rejected(&self, n: u64) -> u64 {
        self.lines_rejected.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    pub fn written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.lines_rejected.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Shared status cell of one step copy: identity, state and counters.
#[derive(Debug)]
pub struct StepStatus {
    step_id: String,
    copy_nr: usize,
    state: AtomicU8,
    counters: StepCounters,
}

impl StepStatus {
    pub fn new(step_id: impl Into<String>, copy_nr: usize) -> Self {
        Self {
            step_id: step_id.into(),
            copy_nr,
            state: AtomicU8::new(StepState::Created.as_u8()),
            counters: StepCounters::default(),
        }
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn copy_nr(&self) -> usize {
        self.copy_nr
    }

    pub fn state(&self) -> StepState {
        StepState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: StepState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn counters(&self) -> &StepCounters {
        &self.counters
    }

    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            step_id: self.step_id.clone(),
            copy_nr: self.copy_nr,
            state: self.state(),
            lines_read: self.counters.read(),
            lines_written: self.counters.written(),
            lines_rejected: self.counters.rejected(),
            errors: self.counters.errors(),
        }
    }
}

/// Point-in-time counters of one step copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSnapshot {
    pub step_id: String,
    pub copy_nr: usize,
    pub state: StepState,
    pub lines_read: u64,
    pub lines_written: u64,
    pub lines_rejected: u64,
    pub errors: u64,
}

/// Counters of all copies of one step, summed; state is the worst copy state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub step_id: String,
    pub copies: usize,
    pub state: StepState,
    pub lines_read: u64,
    pub lines_written: u64,
    pub lines_rejected: u64,
    pub errors: u64,
}

/// What kind of problem ended a run.
///
/// # Variants
/// * `Structural` - Graph shape: failed init or incompatible layouts at a merge point
/// * `Engine` - A step failed while processing rows
/// * `Internal` - The runtime itself failed, e.g. a step task panicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Structural,
    Engine,
    Internal,
}

/// The originating failure of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub step_id: String,
    pub copy_nr: usize,
    pub message: String,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} failure in step '{}' copy {}: {}",
            self.kind, self.step_id, self.copy_nr, self.message
        )
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// True when no step failed; an operator stop alone does not fail a run.
    pub success: bool,
    pub stop_mode: Option<StopMode>,
    pub failure: Option<RunFailure>,
    pub steps: Vec<StepSummary>,
    pub copies: Vec<StepSnapshot>,
    pub duration_ms: u64,
}

impl RunResult {
    pub(crate) fn new(
        copies: Vec<StepSnapshot>,
        failure: Option<RunFailure>,
        stop_mode: Option<StopMode>,
        duration: Duration,
    ) -> Self {
        Self {
            success: failure.is_none(),
            stop_mode,
            failure,
            steps: summarize(&copies),
            copies,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&StepSummary> {
        self.steps.iter().find(|summary| summary.step_id == step_id)
    }

    pub fn copy(&self, step_id: &str, copy_nr: usize) -> Option<&StepSnapshot> {
        self.copies
            .iter()
            .find(|snapshot| snapshot.step_id == step_id && snapshot.copy_nr == copy_nr)
    }

    pub fn rows_written(&self) -> u64 {
        self.steps.iter().map(|summary| summary.lines_written).sum()
    }
}

// Preserves the order in which steps first appear in `copies`.
fn summarize(copies: &[StepSnapshot]) -> Vec<StepSummary> {
    let mut summaries: Vec<StepSummary> = Vec::new();
    for snapshot in copies {
        match summaries.iter_mut().find(|s| s.step_id == snapshot.step_id) {
            Some(summary) => {
                summary.copies += 1;
                summary.lines_read += snapshot.lines_read;
                summary.lines_written += snapshot.lines_written;
                summary.lines_rejected += snapshot.lines_rejected;
                summary.errors += snapshot.errors;
                if snapshot.state.severity() > summary.state.severity() {
                    summary.state = snapshot.state;
                }
            }
            None => summaries.push(StepSummary {
                step_id: snapshot.step_id.clone(),
                copies: 1,
                state: snapshot.state,
                lines_read: snapshot.lines_read,
                lines_written: snapshot.lines_written,
                lines_rejected: snapshot.lines_rejected,
                errors: snapshot.errors,
            }),
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(step_id: &str, copy_nr: usize, state: StepState, written: u64) -> StepSnapshot {
        StepSnapshot {
            step_id: step_id.to_string(),
            copy_nr,
            state,
            lines_read: 1,
            lines_written: written,
            lines_rejected: 0,
            errors: 0,
        }
    }

    #[test]
    fn test_state_round_trips_through_status() {
        let status = StepStatus::new("s", 0);
        assert_eq!(status.state(), StepState::Created);
        for state in [
            StepState::Initialized,
            StepState::Running,
            StepState::Done,
            StepState::Stopped,
            StepState::Errored,
        ] {
            status.set_state(state);
            assert_eq!(status.state(), state);
        }
    }

    #[test]
    fn test_counters_return_new_totals() {
        let counters = StepCounters::default();
        assert_eq!(counters.add_read(2), 2);
        assert_eq!(counters.add_read(3), 5);
        assert_eq!(counters.add_written(1), 1);
        assert_eq!(counters.add_error(), 1);
        assert_eq!(counters.read(), 5);
    }

    #[test]
    fn test_summary_takes_worst_state_and_sums() {
        let result = RunResult::new(
            vec![
                snapshot("a", 0, StepState::Done, 4),
                snapshot("b", 0, StepState::Done, 2),
                snapshot("b", 1, StepState::Stopped, 3),
            ],
            None,
            None,
            Duration::from_millis(5),
        );

        assert!(result.success);
        assert_eq!(result.steps.len(), 2);
        let b = result.step("b").unwrap();
        assert_eq!(b.copies, 2);
        assert_eq!(b.lines_written, 5);
        assert_eq!(b.state, StepState::Stopped);
        assert_eq!(result.rows_written(), 9);
        assert_eq!(result.copy("b", 1).unwrap().lines_written, 3);
    }

    #[test]
    fn test_failure_marks_run_unsuccessful() {
        let failure = RunFailure {
            kind: FailureKind::Engine,
            step_id: "a".to_string(),
            copy_nr: 0,
            message: "boom".to_string(),
        };
        let result = RunResult::new(vec![], Some(failure), Some(StopMode::Hard), Duration::ZERO);
        assert!(!result.success);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failure"]["kind"], "engine");
        assert_eq!(json["stop_mode"], "hard");
    }
}

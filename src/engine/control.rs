// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::RowSet;
use crate::errors::{StepError, StopMode};
use crate::observability::messages::engine::{PauseStateChanged, StopRequested};
use crate::observability::messages::StructuredLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Run-wide stop and pause switches shared by the launcher and every step copy.
#[derive(Debug)]
pub(crate) struct RunControl {
    cancel: CancellationToken,
    safe_stop: AtomicBool,
    requested: Mutex<Option<StopMode>>,
    paused: watch::Sender<bool>,
    rowsets: Vec<RowSet>,
}

impl RunControl {
    pub(crate) fn new(rowsets: Vec<RowSet>) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            safe_stop: AtomicBool::new(false),
            requested: Mutex::new(None),
            paused,
            rowsets,
        }
    }

    /// True once a hard stop was requested.
    pub(crate) fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn is_safe_stopping(&self) -> bool {
        self.safe_stop.load(Ordering::Acquire)
    }

    pub(crate) fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// First stop mode requested during the run, if any.
    pub(crate) fn requested_stop(&self) -> Option<StopMode> {
        *self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn stop(&self, mode: StopMode, reason: &str) {
        match mode {
            StopMode::Hard => self.stop_all(reason),
            StopMode::Safe => self.safe_stop(reason),
        }
    }

    /// Abort every rowset and release every waiter. Idempotent.
    pub(crate) fn stop_all(&self, reason: &str) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.record(StopMode::Hard);
        StopRequested {
            mode: StopMode::Hard,
            reason,
        }
        .log();

        self.cancel.cancel();
        for rowset in &self.rowsets {
            rowset.set_errored();
        }
        self.paused.send_replace(false);
    }

    /// Sources finish at their next iteration; everything downstream drains.
    pub(crate) fn safe_stop(&self, reason: &str) {
        if self.safe_stop.swap(true, Ordering::AcqRel) {
            return;
        }
        self.record(StopMode::Safe);
        StopRequested {
            mode: StopMode::Safe,
            reason,
        }
        .log();
        // A paused source never reaches its next iteration
        self.paused.send_replace(false);
    }

    pub(crate) fn pause(&self) {
        if !self.paused.send_replace(true) {
            PauseStateChanged { paused: true }.log();
        }
    }

    pub(crate) fn resume(&self) {
        if self.paused.send_replace(false) {
            PauseStateChanged { paused: false }.log();
        }
    }

    /// Wait while the run is paused. Fails with `Aborted` once a hard stop is requested.
    pub(crate) async fn wait_while_paused(&self) -> Result<(), StepError> {
        if self.is_stopped() {
            return Err(StepError::Aborted);
        }
        if !self.is_paused() {
            return Ok(());
        }

        let mut paused = self.paused.subscribe();
        loop {
            if self.is_stopped() {
                return Err(StepError::Aborted);
            }
            if !*paused.borrow_and_update() {
                return Ok(());
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(StepError::Aborted),
                changed = paused.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn record(&self, mode: StopMode) {
        let mut requested = self.requested.lock().unwrap_or_else(PoisonError::into_inner);
        requested.get_or_insert(mode);
    }
}

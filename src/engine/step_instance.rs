// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle of one step copy.
//!
//! ```text
//! Created -> Initialized -> Running -> Done | Stopped | Errored
//! ```
//!
//! A copy initializes, reports to the launcher and waits for the start signal,
//! which is only sent once every copy of the run initialized. It then calls
//! `process_one_iteration` until the step is done, fails, or the run stops.
//! Whatever the exit path, outputs are closed, inputs are released and
//! `dispose` runs exactly once.

use crate::engine::control::RunControl;
use crate::engine::result::{StepState, StepStatus};
use crate::engine::step_io::StepIo;
use crate::errors::StepError;
use crate::observability::messages::step::{
    StepFailed, StepFinished, StepInitFailed, StepInitialized,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Step;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Launcher decision after the init barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartSignal {
    Pending,
    Start,
    Abort,
}

#[derive(Debug)]
pub(crate) struct InitReport {
    pub(crate) initialized: bool,
}

/// How a copy ended.
#[derive(Debug)]
pub(crate) struct StepReport {
    pub(crate) index: usize,
    pub(crate) state: StepState,
    pub(crate) error: Option<StepError>,
    pub(crate) panic: Option<String>,
}

impl StepReport {
    fn new(index: usize, state: StepState, error: Option<StepError>) -> Self {
        Self {
            index,
            state,
            error,
            panic: None,
        }
    }

    pub(crate) fn panicked(index: usize, message: String) -> Self {
        Self {
            index,
            state: StepState::Errored,
            error: None,
            panic: Some(message),
        }
    }
}

pub(crate) struct StepInstance {
    step: Box<dyn Step>,
    io: StepIo,
    status: Arc<StepStatus>,
    control: Arc<RunControl>,
}

impl StepInstance {
    pub(crate) fn new(
        step: Box<dyn Step>,
        io: StepIo,
        status: Arc<StepStatus>,
        control: Arc<RunControl>,
    ) -> Self {
        Self {
            step,
            io,
            status,
            control,
        }
    }

    pub(crate) async fn run(
        mut self,
        index: usize,
        init_tx: mpsc::UnboundedSender<InitReport>,
        mut start_rx: watch::Receiver<StartSignal>,
    ) -> StepReport {
        let context = self.io.context().clone();

        let init = self.step.init(&context).await;
        match &init {
            Ok(()) => {
                self.status.set_state(StepState::Initialized);
                StepInitialized {
                    step_id: &context.step_id,
                    copy_nr: context.copy_nr,
                }
                .log();
            }
            Err(error) => StepInitFailed {
                step_id: &context.step_id,
                copy_nr: context.copy_nr,
                error,
            }
            .log(),
        }
        // The launcher counts reports until every sender is gone
        let _ = init_tx.send(InitReport {
            initialized: init.is_ok(),
        });
        drop(init_tx);

        let signal = loop {
            let signal = *start_rx.borrow_and_update();
            if signal != StartSignal::Pending {
                break signal;
            }
            if start_rx.changed().await.is_err() {
                break StartSignal::Abort;
            }
        };

        let (state, error) = match (init, signal) {
            (Err(error), _) => {
                self.status.counters().add_error();
                (StepState::Errored, Some(error))
            }
            (Ok(()), StartSignal::Start) => self.run_loop().await,
            (Ok(()), _) => (StepState::Stopped, None),
        };

        self.io.finish();
        self.step.dispose(&context).await;
        self.status.set_state(state);

        let counters = self.status.counters();
        StepFinished {
            step_id: &context.step_id,
            copy_nr: context.copy_nr,
            state,
            lines_read: counters.read(),
            lines_written: counters.written(),
            lines_rejected: counters.rejected(),
        }
        .log();

        StepReport::new(index, state, error)
    }

    async fn run_loop(&mut self) -> (StepState, Option<StepError>) {
        self.status.set_state(StepState::Running);
        let is_source = self.io.is_source();

        loop {
            // Copies share worker threads; give the others a turn
            tokio::task::yield_now().await;

            if self.control.is_stopped() {
                return (StepState::Stopped, None);
            }
            if is_source && self.control.is_safe_stopping() {
                return (StepState::Done, None);
            }

            match self.step.process_one_iteration(&mut self.io).await {
                Ok(true) => {}
                Ok(false) => return (StepState::Done, None),
                Err(StepError::Aborted) => return (StepState::Stopped, None),
                Err(error) => {
                    self.status.counters().add_error();
                    let context = self.io.context();
                    StepFailed {
                        step_id: &context.step_id,
                        copy_nr: context.copy_nr,
                        error: &error,
                    }
                    .log();
                    return (StepState::Errored, Some(error));
                }
            }
        }
    }
}

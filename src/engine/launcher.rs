// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runs a step graph.
//!
//! [`Launcher::launch`] builds the topology, spawns one task per step copy and
//! returns a [`RunHandle`] at once. A monitor task drives the run:
//!
//! 1. **Init barrier**: every copy initializes and reports. If any copy failed
//!    (or a hard stop was already requested) every copy is told to abort, so
//!    no row flows at all. Otherwise every copy is told to start.
//! 2. **Supervision**: copies are collected as they finish. The first copy to
//!    end `Errored` becomes the run failure and triggers the graph's
//!    `on_error` stop mode.
//! 3. **Result**: per-copy counters are snapshotted into a [`RunResult`].
//!
//! A panicking step copy is caught at its task boundary, reported as
//! `Errored`, and its rowsets are released so neighbours cannot block on it.

use crate::config::StepRegistry;
use crate::config::StepGraph;
use crate::engine::control::RunControl;
use crate::engine::result::{
    FailureKind, RunFailure, RunResult, StepSnapshot, StepState, StepStatus,
};
use crate::engine::step_instance::{InitReport, StartSignal, StepReport};
use crate::engine::step_io::CheckpointCallback;
use crate::engine::topology::{CopyLinks, TopologyBuilder};
use crate::errors::{EngineError, StopMode};
use crate::observability::messages::engine::{
    LaunchAborted, RunCompleted, RunFailed, RunStarted,
};
use crate::observability::messages::step::StepPanicked;
use crate::observability::messages::StructuredLog;
use crate::traits::RowListener;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Launches step graphs against one step registry.
///
/// # Example
/// ```no_run
/// use rowflow::config::{StepConfig, StepGraph, StepRegistry};
/// use rowflow::engine::Launcher;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = StepGraph::builder()
///     .step(StepConfig::new("numbers", "row_generator").with_option("limit", 100))
///     .step(StepConfig::new("sink", "pass_through"))
///     .hop("numbers", "sink")
///     .build()
///     .map_err(|errors| format!("{:?}", errors))?;
///
/// let launcher = Launcher::new(StepRegistry::with_builtin_steps());
/// let result = launcher.execute(&graph).await?;
/// assert!(result.success);
/// # Ok(())
/// # }
/// ```
pub struct Launcher {
    registry: Arc<StepRegistry>,
    listeners: HashMap<String, Vec<Arc<dyn RowListener>>>,
    checkpoint: Option<CheckpointCallback>,
}

impl Launcher {
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            listeners: HashMap::new(),
            checkpoint: None,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Observe the rows read and written by every copy of `step_id`.
    pub fn add_row_listener(&mut self, step_id: impl Into<String>, listener: Arc<dyn RowListener>) {
        self.listeners.entry(step_id.into()).or_default().push(listener);
    }

    /// Called with a copy's snapshot at each of its checkpoints.
    pub fn on_checkpoint<F>(&mut self, callback: F)
    where
        F: Fn(&StepSnapshot) + Send + Sync + 'static,
    {
        self.checkpoint = Some(Arc::new(callback));
    }

    /// Build and start a run. Must be called within a tokio runtime.
    ///
    /// Fails before anything is spawned when a step cannot be created or,
    /// in safe mode, when incompatible layouts meet at a merge point.
    pub fn launch(&self, graph: &StepGraph) -> Result<RunHandle, EngineError> {
        let topology =
            TopologyBuilder::new(graph, &self.registry, &self.listeners, self.checkpoint.clone())
                .build()?;
        let copy_count = topology.instances.len();
        let control = topology.control;
        let statuses = topology.statuses;

        RunStarted {
            step_count: graph.steps().len(),
            copy_count,
            buffer_size: graph.run_options().buffer_size,
        }
        .log();

        let (init_tx, init_rx) = mpsc::unbounded_channel();
        let (start_tx, start_rx) = watch::channel(StartSignal::Pending);
        let mut copies = JoinSet::new();

        for (index, (instance, links)) in topology
            .instances
            .into_iter()
            .zip(topology.links)
            .enumerate()
        {
            let task = tokio::spawn(instance.run(index, init_tx.clone(), start_rx.clone()));
            let status = statuses[index].clone();
            copies.spawn(supervise(index, task, links, status));
        }
        drop(init_tx);

        let monitor = tokio::spawn(monitor(Monitor {
            copies,
            init_rx,
            start_tx,
            control: control.clone(),
            statuses: statuses.clone(),
            step_count: graph.steps().len(),
            copy_count,
            on_error: graph.run_options().on_error,
            started: Instant::now(),
        }));

        Ok(RunHandle {
            control,
            statuses,
            monitor,
        })
    }

    /// Launch a run and wait for it to finish.
    pub async fn execute(&self, graph: &StepGraph) -> Result<RunResult, EngineError> {
        self.launch(graph)?.wait().await
    }
}

/// Control over a launched run.
pub struct RunHandle {
    control: Arc<RunControl>,
    statuses: Vec<Arc<StepStatus>>,
    monitor: JoinHandle<RunResult>,
}

impl RunHandle {
    pub fn stop(&self, mode: StopMode) {
        self.control.stop(mode, "requested by caller");
    }

    /// Abort every rowset at once; in-flight rows are discarded.
    pub fn stop_all(&self) {
        self.stop(StopMode::Hard);
    }

    /// Stop the sources and let everything downstream drain.
    pub fn safe_stop(&self) {
        self.stop(StopMode::Safe);
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// Live snapshot of every copy.
    pub fn status(&self) -> Vec<StepSnapshot> {
        self.statuses.iter().map(|status| status.snapshot()).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.monitor.is_finished()
    }

    pub async fn wait(self) -> Result<RunResult, EngineError> {
        self.monitor
            .await
            .map_err(|e| EngineError::Internal(format!("run monitor failed: {}", e)))
    }
}

async fn supervise(
    index: usize,
    task: JoinHandle<StepReport>,
    links: CopyLinks,
    status: Arc<StepStatus>,
) -> StepReport {
    match task.await {
        Ok(report) => report,
        Err(error) => {
            links.release();
            status.set_state(StepState::Errored);
            status.counters().add_error();
            let message = panic_message(error);
            StepPanicked {
                step_id: status.step_id(),
                copy_nr: status.copy_nr(),
                message: &message,
            }
            .log();
            StepReport::panicked(index, message)
        }
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "step panicked".to_string()
    }
}

struct Monitor {
    copies: JoinSet<StepReport>,
    init_rx: mpsc::UnboundedReceiver<InitReport>,
    start_tx: watch::Sender<StartSignal>,
    control: Arc<RunControl>,
    statuses: Vec<Arc<StepStatus>>,
    step_count: usize,
    copy_count: usize,
    on_error: StopMode,
    started: Instant,
}

async fn monitor(mut state: Monitor) -> RunResult {
    // Init barrier: a copy that died during init never reports
    let mut initialized = 0;
    while let Some(report) = state.init_rx.recv().await {
        if report.initialized {
            initialized += 1;
        }
    }
    let aborted = initialized < state.copy_count || state.control.is_stopped();
    if aborted {
        LaunchAborted {
            failed_inits: state.copy_count - initialized,
            copy_count: state.copy_count,
        }
        .log();
        state.start_tx.send_replace(StartSignal::Abort);
    } else {
        state.start_tx.send_replace(StartSignal::Start);
    }

    let mut failure: Option<RunFailure> = None;
    while let Some(joined) = state.copies.join_next().await {
        let report = match joined {
            Ok(report) => report,
            Err(error) => {
                // supervise never panics; only a runtime shutdown lands here
                failure.get_or_insert_with(|| RunFailure {
                    kind: FailureKind::Internal,
                    step_id: String::new(),
                    copy_nr: 0,
                    message: error.to_string(),
                });
                continue;
            }
        };
        if report.state != StepState::Errored || failure.is_some() {
            continue;
        }

        let status = &state.statuses[report.index];
        let (kind, message) = match (&report.panic, &report.error) {
            (Some(panic), _) => (FailureKind::Internal, format!("step panicked: {}", panic)),
            (None, Some(error)) if aborted || error.is_structural() => {
                (FailureKind::Structural, error.to_string())
            }
            (None, Some(error)) => (FailureKind::Engine, error.to_string()),
            (None, None) => (FailureKind::Engine, "step failed".to_string()),
        };
        RunFailed {
            step_id: status.step_id(),
            copy_nr: status.copy_nr(),
            message: &message,
        }
        .log();
        if !aborted {
            state.control.stop(state.on_error, &message);
        }
        failure = Some(RunFailure {
            kind,
            step_id: status.step_id().to_string(),
            copy_nr: status.copy_nr(),
            message,
        });
    }

    let snapshots = state.statuses.iter().map(|status| status.snapshot()).collect();
    let result = RunResult::new(
        snapshots,
        failure,
        state.control.requested_stop(),
        state.started.elapsed(),
    );
    if result.success {
        RunCompleted {
            step_count: state.step_count,
            rows_written: result.rows_written(),
            duration: state.started.elapsed(),
        }
        .log();
    }
    result
}

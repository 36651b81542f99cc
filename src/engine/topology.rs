// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turns a validated [`StepGraph`] into runnable step copies.
//!
//! Every hop gets one rowset per (producer copy, consumer copy) pair. All the
//! input rowsets of one consumer copy share that copy's readable signal. The
//! consumer's distribution policy is baked into the producer side
//! ([`OutputHop`]), so no policy decision is made per row.

use crate::config::{HopKind, StepGraph, StepRegistry};
use crate::engine::control::RunControl;
use crate::engine::error_router::ErrorRouter;
use crate::engine::merge::{InputStream, InputStreams};
use crate::engine::output::OutputHop;
use crate::engine::result::StepStatus;
use crate::engine::rowset::RowSet;
use crate::engine::safe_mode::check_compatible;
use crate::engine::step_instance::StepInstance;
use crate::engine::step_io::{CheckpointCallback, StepIo, StepIoParts};
use crate::errors::EngineError;
use crate::model::SchemaRef;
use crate::observability::messages::engine::TopologyBuilt;
use crate::observability::messages::validation::IncompatibleMergeDetected;
use crate::observability::messages::StructuredLog;
use crate::traits::{RowListener, Step, StepContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// The rowsets one copy touches, kept outside the copy so the launcher can
/// release them when the copy's task dies.
#[derive(Debug, Default)]
pub(crate) struct CopyLinks {
    inputs: Vec<RowSet>,
    outputs: Vec<RowSet>,
}

impl CopyLinks {
    pub(crate) fn release(&self) {
        for rowset in &self.outputs {
            rowset.mark_done();
        }
        for rowset in &self.inputs {
            rowset.set_errored();
        }
    }
}

pub(crate) struct Topology {
    pub(crate) instances: Vec<StepInstance>,
    pub(crate) statuses: Vec<Arc<StepStatus>>,
    pub(crate) links: Vec<CopyLinks>,
    pub(crate) control: Arc<RunControl>,
}

pub(crate) struct TopologyBuilder<'a> {
    graph: &'a StepGraph,
    registry: &'a StepRegistry,
    listeners: &'a HashMap<String, Vec<Arc<dyn RowListener>>>,
    checkpoint: Option<CheckpointCallback>,
}

impl<'a> TopologyBuilder<'a> {
    pub(crate) fn new(
        graph: &'a StepGraph,
        registry: &'a StepRegistry,
        listeners: &'a HashMap<String, Vec<Arc<dyn RowListener>>>,
        checkpoint: Option<CheckpointCallback>,
    ) -> Self {
        Self {
            graph,
            registry,
            listeners,
            checkpoint,
        }
    }

    pub(crate) fn build(self) -> Result<Topology, EngineError> {
        let graph = self.graph;
        let run = graph.run_options();

        // One step object per copy, created up front so option errors fail the launch
        let mut steps: HashMap<&str, Vec<Box<dyn Step>>> = HashMap::new();
        for config in graph.steps() {
            let copies = (0..config.copies)
                .map(|_| self.registry.create(config))
                .collect::<Result<Vec<_>, _>>()?;
            steps.insert(config.id.as_str(), copies);
        }

        if run.safe_mode {
            check_merge_points(graph, &steps)?;
        }

        // rowsets[hop][producer copy][consumer copy]
        let readable: HashMap<&str, Vec<Arc<Notify>>> = graph
            .steps()
            .iter()
            .map(|config| {
                let signals = (0..config.copies).map(|_| Arc::new(Notify::new())).collect();
                (config.id.as_str(), signals)
            })
            .collect();
        let mut rowsets: Vec<Vec<Vec<RowSet>>> = Vec::with_capacity(graph.hops().len());
        for hop in graph.hops() {
            let capacity = hop.buffer_size.unwrap_or(run.buffer_size);
            let producers = copies_of(graph, &hop.from);
            let consumer_signals = &readable[hop.to.as_str()];
            let matrix = (0..producers)
                .map(|p| {
                    consumer_signals
                        .iter()
                        .enumerate()
                        .map(|(c, signal)| {
                            RowSet::with_reader_signal(
                                format!("{}.{} -> {}.{}", hop.from, p, hop.to, c),
                                capacity,
                                signal.clone(),
                            )
                        })
                        .collect()
                })
                .collect();
            rowsets.push(matrix);
        }

        let all_rowsets: Vec<RowSet> = rowsets.iter().flatten().flatten().cloned().collect();
        let rowset_count = all_rowsets.len();
        let control = Arc::new(RunControl::new(all_rowsets));

        let mut instances = Vec::new();
        let mut statuses = Vec::new();
        let mut links = Vec::new();
        for config in graph.steps() {
            let Some(step_objects) = steps.remove(config.id.as_str()) else {
                continue;
            };
            let listeners = self.listeners.get(&config.id).cloned().unwrap_or_default();
            let checkpoint_interval = config
                .checkpoint_interval
                .unwrap_or(run.checkpoint_interval);

            for (copy_nr, step) in step_objects.into_iter().enumerate() {
                let mut copy_links = CopyLinks::default();
                let mut streams = Vec::new();
                let mut outputs = Vec::new();
                let mut errors = None;

                for (hop_index, hop) in graph.hops().iter().enumerate() {
                    if hop.to == config.id {
                        for row in &rowsets[hop_index] {
                            let rowset = row[copy_nr].clone();
                            copy_links.inputs.push(rowset.clone());
                            streams.push(match hop.kind {
                                HopKind::Main => InputStream::new(hop.from.clone(), rowset),
                                HopKind::Error => InputStream::error_hop(hop.from.clone(), rowset),
                            });
                        }
                    }
                    if hop.from == config.id {
                        let targets = rowsets[hop_index][copy_nr].clone();
                        copy_links.outputs.extend(targets.iter().cloned());
                        let output =
                            OutputHop::new(hop.to.clone(), graph.distribution_of(&hop.to), targets);
                        match (hop.kind, &config.error_handling) {
                            (HopKind::Error, Some(handling)) => {
                                errors = Some(ErrorRouter::new(handling.clone(), output));
                            }
                            _ => outputs.push(output),
                        }
                    }
                }

                let merge = config.merge.unwrap_or_else(|| step.merge_policy());
                let readable_signal = readable[config.id.as_str()][copy_nr].clone();
                let status = Arc::new(StepStatus::new(config.id.clone(), copy_nr));
                let io = StepIo::new(StepIoParts {
                    context: StepContext {
                        step_id: config.id.clone(),
                        type_id: config.type_id.clone(),
                        copy_nr,
                        copies: config.copies,
                    },
                    inputs: InputStreams::new(
                        merge,
                        streams,
                        readable_signal,
                        run.safe_mode_per_row,
                    ),
                    outputs,
                    errors,
                    status: status.clone(),
                    control: control.clone(),
                    listeners: listeners.clone(),
                    checkpoint_interval,
                    checkpoint: self.checkpoint.clone(),
                    validate_puts: run.safe_mode_per_row,
                });

                instances.push(StepInstance::new(step, io, status.clone(), control.clone()));
                statuses.push(status);
                links.push(copy_links);
            }
        }

        TopologyBuilt {
            step_count: graph.steps().len(),
            copy_count: instances.len(),
            rowset_count,
        }
        .log();

        Ok(Topology {
            instances,
            statuses,
            links,
            control,
        })
    }
}

fn copies_of(graph: &StepGraph, step_id: &str) -> usize {
    graph.step(step_id).map_or(0, |config| config.copies)
}

/// Propagate static layouts in topological order and check every step fed by
/// more than one main hop.
fn check_merge_points(
    graph: &StepGraph,
    steps: &HashMap<&str, Vec<Box<dyn Step>>>,
) -> Result<(), EngineError> {
    let mut layouts: HashMap<&str, Option<SchemaRef>> = HashMap::new();

    for config in graph.topological_order() {
        let main_inputs: Vec<&str> = graph
            .inputs_of(&config.id)
            .filter(|hop| hop.kind == HopKind::Main)
            .map(|hop| hop.from.as_str())
            .collect();
        let known: Vec<SchemaRef> = main_inputs
            .iter()
            .filter_map(|from| layouts.get(from).cloned().flatten())
            .collect();

        if main_inputs.len() >= 2 {
            if let Some((reference, others)) = known.split_first() {
                for other in others {
                    if let Err(source) = check_compatible(reference, other) {
                        let reason = source.to_string();
                        IncompatibleMergeDetected {
                            step_id: &config.id,
                            reason: &reason,
                        }
                        .log();
                        return Err(EngineError::IncompatibleMerge {
                            step_id: config.id.clone(),
                            source,
                        });
                    }
                }
            }
        }

        let output = steps
            .get(config.id.as_str())
            .and_then(|copies| copies.first())
            .and_then(|step| step.output_schema(&known));
        layouts.insert(config.id.as_str(), output);
    }
    Ok(())
}

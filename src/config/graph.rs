// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validated, read-only view of a step graph.
//!
//! A [`StepGraph`] is what the launcher consumes. It is only ever built from a
//! configuration that passed [`validate_graph`](crate::config::validate_graph),
//! so every hop resolves and no cycle exists. Error hops, declared on the
//! producing step through `error_handling.target`, are listed next to the main
//! hops and tagged [`HopKind::Error`].

use crate::config::{
    validate_graph, DistributionPolicy, GraphConfig, HopConfig, RunOptions, StepConfig,
};
use crate::errors::ValidationError;
use std::collections::{HashMap, VecDeque};

/// Whether a hop carries normal rows or rejected rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopKind {
    Main,
    Error,
}

/// A resolved hop between two steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub kind: HopKind,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct StepGraph {
    run: RunOptions,
    steps: Vec<StepConfig>,
    hops: Vec<Hop>,
}

impl StepGraph {
    /// Validate `cfg` and build the graph, or return every validation error found.
    pub fn from_config(cfg: &GraphConfig) -> Result<Self, Vec<ValidationError>> {
        validate_graph(cfg)?;

        let mut hops: Vec<Hop> = cfg
            .hops
            .iter()
            .map(|hop| Hop {
                from: hop.from.clone(),
                to: hop.to.clone(),
                kind: HopKind::Main,
                buffer_size: hop.buffer_size,
            })
            .collect();
        hops.extend(cfg.steps.iter().filter_map(|step| {
            step.error_handling.as_ref().map(|handling| Hop {
                from: step.id.clone(),
                to: handling.target.clone(),
                kind: HopKind::Error,
                buffer_size: None,
            })
        }));

        Ok(Self {
            run: cfg.run.clone(),
            steps: cfg.steps.clone(),
            hops,
        })
    }

    pub fn builder() -> StepGraphBuilder {
        StepGraphBuilder::default()
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.run
    }

    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Hops (main and error) ending at `id`, in declaration order.
    pub fn inputs_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Hop> + 'a {
        self.hops.iter().filter(move |hop| hop.to == id)
    }

    /// Hops (main and error) starting at `id`, in declaration order.
    pub fn outputs_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Hop> + 'a {
        self.hops.iter().filter(move |hop| hop.from == id)
    }

    /// A source has no incoming hop of any kind.
    pub fn is_source(&self, id: &str) -> bool {
        self.inputs_of(id).next().is_none()
    }

    pub fn distribution_of(&self, id: &str) -> DistributionPolicy {
        self.step(id)
            .map(|step| step.distribution.clone())
            .unwrap_or_default()
    }

    /// Steps ordered so every producer precedes its consumers.
    ///
    /// Kahn's algorithm seeded in declaration order, so the order is stable for
    /// a given graph file.
    pub fn topological_order(&self) -> Vec<&StepConfig> {
        let mut in_degree: HashMap<&str, usize> =
            self.steps.iter().map(|step| (step.id.as_str(), 0)).collect();
        for hop in &self.hops {
            if let Some(count) = in_degree.get_mut(hop.to.as_str()) {
                *count += 1;
            }
        }

        let mut ready: VecDeque<&StepConfig> = self
            .steps
            .iter()
            .filter(|step| in_degree.get(step.id.as_str()) == Some(&0))
            .collect();
        let mut ordered = Vec::with_capacity(self.steps.len());

        while let Some(step) = ready.pop_front() {
            ordered.push(step);
            for hop in self.outputs_of(&step.id) {
                if let Some(count) = in_degree.get_mut(hop.to.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(next) = self.step(&hop.to) {
                            ready.push_back(next);
                        }
                    }
                }
            }
        }
        ordered
    }
}

/// Programmatic construction of a [`StepGraph`], validated on [`build`](Self::build).
///
/// # Example
/// ```
/// use rowflow::config::{StepConfig, StepGraph};
///
/// let graph = StepGraph::builder()
///     .step(StepConfig::new("numbers", "row_generator"))
///     .step(StepConfig::new("out", "pass_through").with_copies(2))
///     .hop("numbers", "out")
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.steps().len(), 2);
/// assert!(graph.is_source("numbers"));
/// ```
#[derive(Debug, Default)]
pub struct StepGraphBuilder {
    config: GraphConfig,
}

impl StepGraphBuilder {
    pub fn run_options(mut self, run: RunOptions) -> Self {
        self.config.run = run;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.config.run.buffer_size = buffer_size;
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.config.steps.push(step);
        self
    }

    pub fn hop(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config.hops.push(HopConfig::new(from, to));
        self
    }

    pub fn hop_with_buffer(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        buffer_size: usize,
    ) -> Self {
        let mut hop = HopConfig::new(from, to);
        hop.buffer_size = Some(buffer_size);
        self.config.hops.push(hop);
        self
    }

    pub fn build(self) -> Result<StepGraph, Vec<ValidationError>> {
        StepGraph::from_config(&self.config)
    }
}

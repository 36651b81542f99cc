// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test-only steps that make engine behavior observable.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::StepIo;
use crate::errors::StepError;
use crate::model::{Record, Value};
use crate::traits::{Step, StepContext};

/// Rows seen by every copy of a [`Collector`], with the copy that saw them.
#[derive(Debug, Clone, Default)]
pub struct CollectorHandle(Arc<Mutex<Vec<(usize, Record)>>>);

impl CollectorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<Record> {
        self.0.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    /// First field of every collected row as an integer, in arrival order.
    pub fn ints(&self) -> Vec<i64> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, r)| r.row.get(0).and_then(Value::as_i64))
            .collect()
    }

    /// Every collected row with the copy that read it, in arrival order.
    pub fn records_by_copy(&self) -> Vec<(usize, Record)> {
        self.0.lock().unwrap().clone()
    }

    pub fn ints_of_copy(&self, copy_nr: usize) -> Vec<i64> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(copy, _)| *copy == copy_nr)
            .filter_map(|(_, r)| r.row.get(0).and_then(Value::as_i64))
            .collect()
    }
}

/// Records every row it reads and passes it on.
pub struct Collector {
    handle: CollectorHandle,
    delay: Option<Duration>,
}

impl Collector {
    pub fn new(handle: CollectorHandle) -> Self {
        Self {
            handle,
            delay: None,
        }
    }

    /// Sleep after every row, making this a slow consumer.
    pub fn slow(handle: CollectorHandle, delay: Duration) -> Self {
        Self {
            handle,
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl Step for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        let Some(record) = io.get_row().await? else {
            return Ok(false);
        };
        let copy_nr = io.context().copy_nr;
        self.handle.0.lock().unwrap().push((copy_nr, record.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        io.put_row(record).await?;
        Ok(true)
    }
}

/// Fails in `init`.
pub struct FailingInitStep;

#[async_trait]
impl Step for FailingInitStep {
    fn name(&self) -> &'static str {
        "failing_init"
    }

    async fn init(&mut self, context: &StepContext) -> Result<(), StepError> {
        Err(StepError::Init(format!(
            "cannot initialize {} copy {}",
            context.step_id, context.copy_nr
        )))
    }

    async fn process_one_iteration(&mut self, _io: &mut StepIo) -> Result<bool, StepError> {
        Ok(false)
    }
}

/// Pass-through counting `init` and `dispose` calls across all its copies.
pub struct LifecycleCounter {
    inits: Arc<AtomicUsize>,
    disposals: Arc<AtomicUsize>,
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleCounts {
    pub inits: Arc<AtomicUsize>,
    pub disposals: Arc<AtomicUsize>,
}

impl LifecycleCounts {
    pub fn step(&self) -> LifecycleCounter {
        LifecycleCounter {
            inits: self.inits.clone(),
            disposals: self.disposals.clone(),
        }
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step for LifecycleCounter {
    fn name(&self) -> &'static str {
        "lifecycle_counter"
    }

    async fn init(&mut self, _context: &StepContext) -> Result<(), StepError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        match io.get_row().await? {
            Some(record) => {
                io.put_row(record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn dispose(&mut self, _context: &StepContext) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sends each row to the copy of `target` picked by its first integer field.
pub struct CopyRouter {
    target: String,
}

impl CopyRouter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl Step for CopyRouter {
    fn name(&self) -> &'static str {
        "copy_router"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        let Some(record) = io.get_row().await? else {
            return Ok(false);
        };
        let copies = io.output_copies(&self.target).unwrap_or(1) as i64;
        let key = record.row.get(0).and_then(Value::as_i64).unwrap_or(0);
        let target = self.target.clone();
        io.put_row_to(&target, key.rem_euclid(copies) as usize, record)
            .await?;
        Ok(true)
    }
}

/// Panics on the first row it reads.
pub struct PanickingStep;

#[async_trait]
impl Step for PanickingStep {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        if io.get_row().await?.is_some() {
            panic!("row handling bug");
        }
        Ok(false)
    }
}

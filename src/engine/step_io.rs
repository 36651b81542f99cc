// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::control::RunControl;
use crate::engine::error_router::{ErrorRouter, RowError};
use crate::engine::merge::InputStreams;
use crate::engine::output::OutputHop;
use crate::engine::result::{StepSnapshot, StepStatus};
use crate::errors::StepError;
use crate::observability::messages::step::{RowRejected, StepCheckpoint};
use crate::observability::messages::StructuredLog;
use crate::model::{Record, SchemaRef};
use crate::traits::{RowListener, StepContext};
use std::sync::Arc;

/// Called with a snapshot of a step copy at every checkpoint.
pub type CheckpointCallback = Arc<dyn Fn(&StepSnapshot) + Send + Sync>;

/// Row I/O handed to a step on every iteration.
///
/// Reads pull from the copy's input rowsets through its merge policy, writes
/// go to every downstream hop, and rejected rows go to the error hop. Every
/// primitive waits while the run is paused and fails with
/// [`StepError::Aborted`] once the run is hard-stopped.
pub struct StepIo {
    context: StepContext,
    inputs: InputStreams,
    outputs: Vec<OutputHop>,
    errors: Option<ErrorRouter>,
    status: Arc<StepStatus>,
    control: Arc<RunControl>,
    listeners: Vec<Arc<dyn RowListener>>,
    checkpoint_interval: u64,
    checkpoint: Option<CheckpointCallback>,
    validate_puts: bool,
}

pub(crate) struct StepIoParts {
    pub(crate) context: StepContext,
    pub(crate) inputs: InputStreams,
    pub(crate) outputs: Vec<OutputHop>,
    pub(crate) errors: Option<ErrorRouter>,
    pub(crate) status: Arc<StepStatus>,
    pub(crate) control: Arc<RunControl>,
    pub(crate) listeners: Vec<Arc<dyn RowListener>>,
    pub(crate) checkpoint_interval: u64,
    pub(crate) checkpoint: Option<CheckpointCallback>,
    pub(crate) validate_puts: bool,
}

impl StepIo {
    pub(crate) fn new(parts: StepIoParts) -> Self {
        Self {
            context: parts.context,
            inputs: parts.inputs,
            outputs: parts.outputs,
            errors: parts.errors,
            status: parts.status,
            control: parts.control,
            listeners: parts.listeners,
            checkpoint_interval: parts.checkpoint_interval,
            checkpoint: parts.checkpoint,
            validate_puts: parts.validate_puts,
        }
    }

    pub fn context(&self) -> &StepContext {
        &self.context
    }

    /// True once the run was hard-stopped.
    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }

    pub fn has_error_output(&self) -> bool {
        self.errors.is_some()
    }

    /// Layout of the rows read so far; `None` before the first row.
    pub fn input_schema(&self) -> Option<&SchemaRef> {
        self.inputs.reference_schema()
    }

    /// Number of copies of a downstream step, if this step has a main hop to it.
    pub fn output_copies(&self, step_id: &str) -> Option<usize> {
        self.outputs
            .iter()
            .find(|hop| hop.target_step() == step_id)
            .map(OutputHop::copies)
    }

    /// Next input row; `Ok(None)` once every input reached end of stream.
    pub async fn get_row(&mut self) -> Result<Option<Record>, StepError> {
        self.control.wait_while_paused().await?;
        let record = self.inputs.next().await?;
        self.record_read(record.as_ref());
        Ok(record)
    }

    /// Next row from the copies of one producer step only.
    pub async fn get_row_from(&mut self, step_id: &str) -> Result<Option<Record>, StepError> {
        self.control.wait_while_paused().await?;
        let record = self.inputs.next_from(step_id).await?;
        self.record_read(record.as_ref());
        Ok(record)
    }

    /// Send a row down every main hop.
    pub async fn put_row(&mut self, record: Record) -> Result<(), StepError> {
        self.control.wait_while_paused().await?;
        if self.validate_puts {
            record.schema.validate_row(&record.row)?;
        }
        for listener in &self.listeners {
            listener.row_written(&self.context, &record);
        }

        let mut deliveries = 0;
        if let Some((last, rest)) = self.outputs.split_last_mut() {
            for hop in rest {
                deliveries += hop.deliver(record.clone()).await?;
            }
            deliveries += last.deliver(record).await?;
        }
        self.record_written(deliveries.max(1));
        Ok(())
    }

    /// Send a row to one copy of one downstream step, bypassing its distribution policy.
    pub async fn put_row_to(
        &mut self,
        step_id: &str,
        copy_nr: usize,
        record: Record,
    ) -> Result<(), StepError> {
        self.control.wait_while_paused().await?;
        if self.validate_puts {
            record.schema.validate_row(&record.row)?;
        }
        let hop = self
            .outputs
            .iter()
            .find(|hop| hop.target_step() == step_id)
            .ok_or_else(|| StepError::UnknownTarget {
                step: step_id.to_string(),
                copy: copy_nr,
            })?;
        for listener in &self.listeners {
            listener.row_written(&self.context, &record);
        }
        hop.deliver_to(copy_nr, record).await?;
        self.record_written(1);
        Ok(())
    }

    /// Divert a bad row to the error hop.
    ///
    /// Fails with [`StepError::Data`] when the step has no error hop, and with
    /// [`StepError::RejectionLimit`] once the configured limits are exceeded.
    pub async fn put_error(&mut self, record: Record, error: RowError) -> Result<(), StepError> {
        self.control.wait_while_paused().await?;
        let Some(router) = self.errors.as_mut() else {
            return Err(StepError::Data(error.description));
        };

        let routed = router.error_record(record, &error)?;
        RowRejected {
            step_id: &self.context.step_id,
            copy_nr: self.context.copy_nr,
            description: &error.description,
        }
        .log();
        for listener in &self.listeners {
            listener.error_row_written(&self.context, &routed);
        }
        router.deliver(routed).await?;

        let counters = self.status.counters();
        let rejected = counters.add_rejected(1);
        router.check_limits(rejected, counters.read())
    }

    /// A copy with no input of any kind.
    pub(crate) fn is_source(&self) -> bool {
        self.inputs.is_source()
    }

    /// Close every output and release every input. Called once when the copy exits.
    pub(crate) fn finish(&self) {
        for hop in &self.outputs {
            hop.mark_done();
        }
        if let Some(router) = &self.errors {
            router.mark_done();
        }
        self.inputs.abandon();
    }

    fn record_read(&self, record: Option<&Record>) {
        let Some(record) = record else {
            return;
        };
        for listener in &self.listeners {
            listener.row_read(&self.context, record);
        }
        let read = self.status.counters().add_read(1);
        self.maybe_checkpoint(read - 1, read);
    }

    fn record_written(&self, deliveries: u64) {
        let written = self.status.counters().add_written(deliveries);
        // Sources have nothing to read, so they checkpoint on writes
        if self.inputs.is_source() {
            self.maybe_checkpoint(written - deliveries, written);
        }
    }

    fn maybe_checkpoint(&self, before: u64, after: u64) {
        let interval = self.checkpoint_interval;
        if interval == 0 || before / interval == after / interval {
            return;
        }
        let snapshot = self.status.snapshot();
        StepCheckpoint {
            step_id: &snapshot.step_id,
            copy_nr: snapshot.copy_nr,
            lines_read: snapshot.lines_read,
            lines_written: snapshot.lines_written,
        }
        .log();
        if let Some(callback) = &self.checkpoint {
            callback(&snapshot);
        }
    }
}

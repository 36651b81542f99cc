// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Multi-input merge for a step copy.
//!
//! A step copy reading from several rowsets interleaves them by one of two
//! policies:
//!
//! * **Round-robin** keeps reading the current input while it has rows, up to
//!   [`ROWS_IN_BLOCK`] rows, then moves on. Empty inputs are skipped, finished
//!   inputs are dropped, and when every live input is empty the copy waits on
//!   its shared readable signal. End of stream is reported once every input
//!   has finished.
//! * **Priority** reads the inputs strictly in declaration order: input `i+1`
//!   is not touched until input `i` reached end of stream. The first row of
//!   every later input is checked against the reference layout (the first
//!   layout seen), so a mismatch fails as soon as that input is reached.

use crate::config::consts::ROWS_IN_BLOCK;
use crate::config::MergePolicy;
use crate::engine::rowset::{RowSet, TryGet};
use crate::engine::safe_mode::check_compatible;
use crate::errors::StepError;
use crate::model::{Record, SchemaRef};
use std::sync::Arc;
use tokio::sync::Notify;

/// One input rowset and the step feeding it.
#[derive(Debug)]
pub(crate) struct InputStream {
    source_step: String,
    rowset: RowSet,
    checked: bool,
    // Error hops carry their own layout and skip every layout check
    exempt: bool,
}

impl InputStream {
    pub(crate) fn new(source_step: impl Into<String>, rowset: RowSet) -> Self {
        Self {
            source_step: source_step.into(),
            rowset,
            checked: false,
            exempt: false,
        }
    }

    pub(crate) fn error_hop(source_step: impl Into<String>, rowset: RowSet) -> Self {
        Self {
            exempt: true,
            ..Self::new(source_step, rowset)
        }
    }
}

#[derive(Debug)]
pub(crate) struct InputStreams {
    policy: MergePolicy,
    streams: Vec<InputStream>,
    readable: Arc<Notify>,
    current: usize,
    block: usize,
    reference: Option<SchemaRef>,
    per_row_check: bool,
    source: bool,
}

impl InputStreams {
    pub(crate) fn new(
        policy: MergePolicy,
        streams: Vec<InputStream>,
        readable: Arc<Notify>,
        per_row_check: bool,
    ) -> Self {
        Self {
            policy,
            source: streams.is_empty(),
            streams,
            readable,
            current: 0,
            block: 0,
            reference: None,
            per_row_check,
        }
    }

    /// True when the copy was built without any input.
    pub(crate) fn is_source(&self) -> bool {
        self.source
    }

    pub(crate) fn reference_schema(&self) -> Option<&SchemaRef> {
        self.reference.as_ref()
    }

    /// Next row by the configured policy; `Ok(None)` once every input finished.
    pub(crate) async fn next(&mut self) -> Result<Option<Record>, StepError> {
        match self.policy {
            MergePolicy::RoundRobin => self.next_round_robin(None).await,
            MergePolicy::Priority => self.next_priority().await,
        }
    }

    /// Next row from the copies of one producer step, round-robin among them.
    pub(crate) async fn next_from(&mut self, step_id: &str) -> Result<Option<Record>, StepError> {
        self.next_round_robin(Some(step_id)).await
    }

    /// Flag every unfinished input errored so its producer cannot block on it.
    pub(crate) fn abandon(&self) {
        for stream in &self.streams {
            stream.rowset.set_errored();
        }
    }

    async fn next_round_robin(
        &mut self,
        source: Option<&str>,
    ) -> Result<Option<Record>, StepError> {
        let wanted = |stream: &InputStream| source.map_or(true, |step| stream.source_step == step);

        loop {
            if !self.streams.iter().any(wanted) {
                return Ok(None);
            }

            let mut scanned = 0;
            while scanned < self.streams.len() {
                let index = self.current % self.streams.len();
                if !wanted(&self.streams[index]) {
                    self.advance(index);
                    scanned += 1;
                    continue;
                }

                match self.streams[index].rowset.try_get()? {
                    TryGet::Row(record) => {
                        self.block += 1;
                        if self.block >= ROWS_IN_BLOCK {
                            self.advance(index);
                        } else {
                            self.current = index;
                        }
                        return self.accept(index, record).map(Some);
                    }
                    TryGet::Empty => {
                        self.advance(index);
                        scanned += 1;
                    }
                    TryGet::Done => {
                        self.streams.remove(index);
                        self.current = index;
                        self.block = 0;
                        if !self.streams.iter().any(wanted) {
                            return Ok(None);
                        }
                    }
                }
            }

            self.readable.notified().await;
        }
    }

    async fn next_priority(&mut self) -> Result<Option<Record>, StepError> {
        loop {
            let Some(stream) = self.streams.first() else {
                return Ok(None);
            };
            match stream.rowset.get().await? {
                Some(record) => return self.accept(0, record).map(Some),
                None => {
                    self.streams.remove(0);
                }
            }
        }
    }

    fn advance(&mut self, index: usize) {
        self.current = index + 1;
        self.block = 0;
    }

    /// Layout checks on a row read from stream `index`.
    fn accept(&mut self, index: usize, record: Record) -> Result<Record, StepError> {
        if self.streams[index].exempt {
            return Ok(record);
        }
        let first_from_stream = !self.streams[index].checked;
        self.streams[index].checked = true;

        let check = self.per_row_check || (first_from_stream && self.policy == MergePolicy::Priority);
        match &self.reference {
            Some(reference) if check && !Arc::ptr_eq(reference, &record.schema) => {
                check_compatible(reference, &record.schema)?;
            }
            Some(_) => {}
            None => self.reference = Some(record.schema.clone()),
        }
        Ok(record)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::MergePolicy;
use crate::engine::StepIo;
use crate::errors::StepError;
use crate::model::SchemaRef;

/// Identity of one running step copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    pub step_id: String,
    pub type_id: String,
    pub copy_nr: usize,
    pub copies: usize,
}

/// Unit of row processing.
///
/// The runtime calls `init` once, then `process_one_iteration` until it returns
/// `Ok(false)` or an error, then `dispose` once. An iteration usually reads one
/// row through [`StepIo::get_row`], transforms it and writes it with
/// [`StepIo::put_row`]; returning `Ok(false)` once input is exhausted ends the
/// copy normally. Returning [`StepError::Aborted`] (what the I/O primitives
/// return during a stop) ends it as stopped rather than failed.
///
/// Each copy gets its own step object, so implementations keep per-copy state
/// in `self` without locking.
#[async_trait]
pub trait Step: Send {
    fn name(&self) -> &'static str;

    async fn init(&mut self, _context: &StepContext) -> Result<(), StepError> {
        Ok(())
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError>;

    async fn dispose(&mut self, _context: &StepContext) {}

    /// Input interleaving this step wants when the graph does not override it.
    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::RoundRobin
    }

    /// Layout of the rows this step writes, given its producers' layouts.
    ///
    /// Used for merge-point checks before launch. The default passes the first
    /// input layout through; sources return their own layout, and `None` means
    /// the layout cannot be known before rows flow.
    fn output_schema(&self, inputs: &[SchemaRef]) -> Option<SchemaRef> {
        inputs.first().cloned()
    }
}

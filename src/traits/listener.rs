// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::Record;
use crate::traits::StepContext;

/// Observer of the rows a step copy reads and writes.
///
/// Callbacks run synchronously on the step's task, so they should be quick.
/// Every method defaults to doing nothing.
pub trait RowListener: Send + Sync {
    fn row_read(&self, _context: &StepContext, _record: &Record) {}

    fn row_written(&self, _context: &StepContext, _record: &Record) {}

    fn error_row_written(&self, _context: &StepContext, _record: &Record) {}
}

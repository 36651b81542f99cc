// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;

use crate::engine::StepIo;
use crate::errors::StepError;
use crate::traits::Step;

/// Options for the abort step.
///
/// # Fields
/// * `after_rows` - Rows passed through before the step fails (default 0)
/// * `message` - Failure message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AbortOptions {
    pub after_rows: u64,
    pub message: Option<String>,
}

/// Fails the run once more than `after_rows` rows reached it.
///
/// Used as a tripwire: attached to a stream that should stay empty, or after
/// a known number of rows to exercise failure handling.
pub struct Abort {
    options: AbortOptions,
    seen: u64,
}

impl Abort {
    pub fn new(options: AbortOptions) -> Self {
        Self { options, seen: 0 }
    }
}

#[async_trait]
impl Step for Abort {
    fn name(&self) -> &'static str {
        "abort"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        let Some(record) = io.get_row().await? else {
            return Ok(false);
        };

        self.seen += 1;
        if self.seen > self.options.after_rows {
            let message = self
                .options
                .message
                .clone()
                .unwrap_or_else(|| format!("aborted after {} rows", self.options.after_rows));
            return Err(StepError::Failed(message));
        }
        io.put_row(record).await?;
        Ok(true)
    }
}

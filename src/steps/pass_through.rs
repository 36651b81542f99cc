// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::MergePolicy;
use crate::engine::StepIo;
use crate::errors::StepError;
use crate::traits::Step;

/// Copies every input row to its outputs unchanged.
///
/// With no outgoing hop it simply consumes its input. The prioritized variant
/// drains its inputs strictly in hop order instead of interleaving them.
pub struct PassThrough {
    name: &'static str,
    merge: MergePolicy,
}

impl PassThrough {
    pub fn new() -> Self {
        Self {
            name: "pass_through",
            merge: MergePolicy::RoundRobin,
        }
    }

    pub fn prioritized() -> Self {
        Self {
            name: "prioritize_streams",
            merge: MergePolicy::Priority,
        }
    }
}

impl Default for PassThrough {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for PassThrough {
    fn name(&self) -> &'static str {
        self.name
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

    fn merge_policy(&self) -> MergePolicy {
        self.merge
    }
}

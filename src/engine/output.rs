// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::DistributionPolicy;
use crate::engine::rowset::RowSet;
use crate::errors::StepError;
use crate::model::{Record, SchemaRef, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The rowsets from one producer copy to every copy of one downstream step.
///
/// `rowsets[i]` feeds consumer copy `i`. The consumer's distribution policy
/// decides whether a row goes to one copy in rotation or to all of them.
#[derive(Debug)]
pub(crate) struct OutputHop {
    target_step: String,
    distribution: DistributionPolicy,
    rowsets: Vec<RowSet>,
    next: usize,
    // Partition field position for the last layout seen
    partition_index: Option<(SchemaRef, usize)>,
}

impl OutputHop {
    pub(crate) fn new(
        target_step: impl Into<String>,
        distribution: DistributionPolicy,
        rowsets: Vec<RowSet>,
    ) -> Self {
        Self {
            target_step: target_step.into(),
            distribution,
            rowsets,
            next: 0,
            partition_index: None,
        }
    }

    pub(crate) fn target_step(&self) -> &str {
        &self.target_step
    }

    pub(crate) fn copies(&self) -> usize {
        self.rowsets.len()
    }

    /// Send `record` down this hop. Returns the number of rowsets it was put to.
    pub(crate) async fn deliver(&mut self, record: Record) -> Result<u64, StepError> {
        match self.distribution {
            DistributionPolicy::Clone => {
                let Some((last, rest)) = self.rowsets.split_last() else {
                    return Ok(0);
                };
                for rowset in rest {
                    rowset.put(record.clone()).await?;
                }
                last.put(record).await?;
                Ok(self.rowsets.len() as u64)
            }
            DistributionPolicy::Copy | DistributionPolicy::Distribute => {
                if self.rowsets.is_empty() {
                    return Ok(0);
                }
                let index = self.next % self.rowsets.len();
                self.next = index + 1;
                self.rowsets[index].put(record).await?;
                Ok(1)
            }
            DistributionPolicy::Partition { .. } => {
                if self.rowsets.is_empty() {
                    return Ok(0);
                }
                let index = self.partition_of(&record)?;
                self.rowsets[index].put(record).await?;
                Ok(1)
            }
        }
    }

    /// Consumer copy owning the record's partition key.
    ///
    /// Integer keys map by `key mod copies`, every other key by a hash of its
    /// text, and nulls land on copy 0.
    fn partition_of(&mut self, record: &Record) -> Result<usize, StepError> {
        let DistributionPolicy::Partition { field } = &self.distribution else {
            return Ok(0);
        };

        let index = match &self.partition_index {
            Some((schema, index)) if Arc::ptr_eq(schema, &record.schema) => *index,
            _ => {
                let index = record.schema.index_of(field).ok_or_else(|| {
                    StepError::Failed(format!(
                        "partition field '{}' for step '{}' is not part of the row layout {}",
                        field, self.target_step, record.schema
                    ))
                })?;
                self.partition_index = Some((record.schema.clone(), index));
                index
            }
        };

        let copies = self.rowsets.len() as u64;
        let slot = match record.row.get(index) {
            None | Some(Value::Null) => 0,
            Some(Value::Integer(key)) => key.rem_euclid(copies as i64) as u64,
            Some(other) => {
                let mut hasher = DefaultHasher::new();
                other.to_string().hash(&mut hasher);
                hasher.finish() % copies
            }
        };
        Ok(slot as usize)
    }

    /// Send `record` to one consumer copy, bypassing the distribution policy.
    pub(crate) async fn deliver_to(&self, copy_nr: usize, record: Record) -> Result<(), StepError> {
        let rowset = self
            .rowsets
            .get(copy_nr)
            .ok_or_else(|| StepError::UnknownTarget {
                step: self.target_step.clone(),
                copy: copy_nr,
            })?;
        rowset.put(record).await?;
        Ok(())
    }

    pub(crate) fn mark_done(&self) {
        for rowset in &self.rowsets {
            rowset.mark_done();
        }
    }
}

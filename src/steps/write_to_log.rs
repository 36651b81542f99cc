// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::StepIo;
use crate::errors::StepError;
use crate::observability::messages::step::RowLogged;
use crate::observability::messages::StructuredLog;
use crate::traits::Step;

/// Logs every row it reads, then passes it on.
pub struct WriteToLog;

#[async_trait]
impl Step for WriteToLog {
    fn name(&self) -> &'static str {
        "write_to_log"
    }

    async fn process_one_iteration(&mut self, io: &mut StepIo) -> Result<bool, StepError> {
        let Some(record) = io.get_row().await? else {
            return Ok(false);
        };

        let context = io.context();
        RowLogged {
            step_id: &context.step_id,
            copy_nr: context.copy_nr,
            fields: &record.schema.field_names().join(", "),
            values: &record.row.to_string(),
        }
        .log();

        io.put_row(record).await?;
        Ok(true)
    }
}

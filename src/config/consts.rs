// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default rowset capacity in rows
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;
/// Default number of rows between progress checkpoints (0 disables them)
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 50_000;
/// Rows a round-robin consumer takes from one input before rotating to the next
pub const ROWS_IN_BLOCK: usize = 500;
/// Default number of copies of a step
pub const DEFAULT_COPIES: usize = 1;

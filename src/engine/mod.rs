mod control;
pub mod error_router;
pub mod launcher;
mod merge;
mod output;
pub mod result;
pub mod rowset;
pub mod safe_mode;
mod step_instance;
pub mod step_io;
mod topology;

pub use error_router::RowError;
pub use launcher::{Launcher, RunHandle};
pub use result::{
    FailureKind, RunFailure, RunResult, StepCounters, StepSnapshot, StepState, StepStatus,
    StepSummary,
};
pub use rowset::{RowSet, TryGet};
pub use safe_mode::check_compatible;
pub use step_io::{CheckpointCallback, StepIo};

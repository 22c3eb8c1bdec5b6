//! Core result types shared across the runner and reports.

mod report;
mod status;

pub use report::{Diagnostics, FailureRecord, RunReport, StageReport};
pub use status::{RunOutcome, StageStatus};

//! Status enums for stage and run outcomes.

use serde::{Deserialize, Serialize};

/// The terminal status of one stage execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage completed. A parallel stage reports `Ok` even when some
    /// children failed; the failures ride along in its report.
    Ok,
    /// The stage failed fatally.
    Fail,
    /// The stage observed a cancellation request and stopped.
    Cancelled,
}

impl StageStatus {
    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if the stage failed or was cancelled.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !self.is_success()
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The terminal outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The root stage completed and an output value is available.
    Success,
    /// An input guardrail rejected the run before any stage executed.
    Blocked,
    /// The root stage failed fatally.
    Failed,
    /// The run was cancelled (explicit abort or timeout); no output.
    Cancelled,
}

impl RunOutcome {
    /// Returns true if the run produced a usable output.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

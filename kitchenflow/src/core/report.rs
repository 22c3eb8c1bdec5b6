//! Execution reports: per-stage results, run diagnostics, and the run report.

use super::{RunOutcome, StageStatus};
use crate::tools::ToolInvocation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A failed child recorded by a parallel stage or run diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// The failed stage's name.
    pub stage: String,
    /// The error message.
    pub error: String,
}

impl FailureRecord {
    /// Creates a new failure record.
    #[must_use]
    pub fn new(stage: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            error: error.into(),
        }
    }
}

/// The result of executing one stage (and, recursively, its children).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage name.
    pub stage: String,
    /// The terminal status.
    pub status: StageStatus,
    /// Error message for failed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// How many times a loop body executed (1 for everything else).
    pub iterations: u32,
    /// For loops: whether the validator accepted the final output.
    /// `Some(false)` marks an exhausted loop whose last output was kept
    /// unvalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<bool>,
    /// Child failures collected by a parallel stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
    /// Reports of child stages, in execution (or declaration) order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StageReport>,
}

impl StageReport {
    /// Creates a successful report.
    #[must_use]
    pub fn ok(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Ok,
            error: None,
            iterations: 1,
            validated: None,
            failures: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a failed report.
    #[must_use]
    pub fn fail(stage: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Fail,
            error: Some(error.into()),
            iterations: 1,
            validated: None,
            failures: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a cancelled report.
    #[must_use]
    pub fn cancelled(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Cancelled,
            error: Some(reason.into()),
            iterations: 1,
            validated: None,
            failures: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attaches child reports.
    #[must_use]
    pub fn with_children(mut self, children: Vec<StageReport>) -> Self {
        self.children = children;
        self
    }

    /// Attaches collected child failures.
    #[must_use]
    pub fn with_failures(mut self, failures: Vec<FailureRecord>) -> Self {
        self.failures = failures;
        self
    }

    /// Sets the loop iteration count and validation flag.
    #[must_use]
    pub fn with_loop_result(mut self, iterations: u32, validated: bool) -> Self {
        self.iterations = iterations;
        self.validated = Some(validated);
        self
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Best-effort diagnostics accumulated over one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Name of the input guardrail that blocked the run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    /// Loops that exhausted their iteration budget without validating.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unvalidated_loops: Vec<String>,
    /// Stage failures observed anywhere in the tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
    /// Every tool invocation made during the run, gated or not.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,
    /// The cancellation reason, if the run was cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

/// The result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The terminal outcome.
    pub outcome: RunOutcome,
    /// The value under the pipeline's designated output key, when the run
    /// produced one. Blocked runs carry the guardrail's replacement text here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// A copy of the blackboard at run end.
    pub final_state: HashMap<String, serde_json::Value>,
    /// The root stage report, absent for blocked runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<StageReport>,
    /// Run diagnostics.
    pub diagnostics: Diagnostics,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl RunReport {
    /// Returns true if the run produced a usable output.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Gets a value from the final state.
    #[must_use]
    pub fn state_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.final_state.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_report_factories() {
        let ok = StageReport::ok("order_loader_agent");
        assert!(ok.is_success());
        assert_eq!(ok.iterations, 1);

        let fail = StageReport::fail("queuing_agent", "boom");
        assert_eq!(fail.status, StageStatus::Fail);
        assert_eq!(fail.error.as_deref(), Some("boom"));
    }

    #[test]
    fn loop_result_marks_unvalidated() {
        let report = StageReport::ok("robust_loyalty_agent").with_loop_result(3, false);
        assert!(report.is_success());
        assert_eq!(report.iterations, 3);
        assert_eq!(report.validated, Some(false));
    }

    #[test]
    fn report_serializes_without_empty_fields() {
        let report = StageReport::ok("leaf");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("failures").is_none());
        assert!(json.get("error").is_none());
    }
}

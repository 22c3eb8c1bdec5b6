//! The default tool safety policy.

use super::{ToolDecision, ToolGuardrail};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The tool name this guardrail watches.
pub const UPDATE_ORDER_STATUS: &str = "update_order_status";

/// Validates order status transitions before the mutating tool runs.
///
/// `update_order_status` may only move an order into one of the allowed
/// states. Anything else is answered with a structured error result in place
/// of executing the tool; the requesting work unit sees it as a domain error,
/// not a failure. All other tools pass through untouched.
pub struct StatusTransitionGuardrail {
    allowed: BTreeSet<String>,
}

impl StatusTransitionGuardrail {
    /// Creates the guardrail with the standard status set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allowed(["QUEUED", "PREPARING", "READY", "COMPLETED"])
    }

    /// Creates the guardrail with a custom allowed set.
    #[must_use]
    pub fn with_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    fn allowed_sorted(&self) -> Vec<&str> {
        // BTreeSet iteration is already sorted.
        self.allowed.iter().map(String::as_str).collect()
    }
}

impl Default for StatusTransitionGuardrail {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolGuardrail for StatusTransitionGuardrail {
    fn name(&self) -> &str {
        "status_transition_guardrail"
    }

    fn inspect(&self, tool_name: &str, args: &serde_json::Value) -> ToolDecision {
        if tool_name != UPDATE_ORDER_STATUS {
            return ToolDecision::Allow;
        }

        let status = args.get("status").and_then(|v| v.as_str());
        match status {
            Some(s) if self.allowed.contains(s) => {
                debug!(tool = tool_name, status = s, "tool call allowed");
                ToolDecision::Allow
            }
            other => {
                let shown = other.unwrap_or("<missing>");
                let allowed = self.allowed_sorted();
                warn!(
                    tool = tool_name,
                    invalid_status = shown,
                    ?allowed,
                    "blocking tool call with invalid status"
                );
                ToolDecision::Substitute(serde_json::json!({
                    "status": "error",
                    "error_message": format!(
                        "'{shown}' is not a valid order status. Allowed values: {allowed:?}"
                    ),
                    "blocked_by": self.name(),
                    "tool": tool_name,
                }))
            }
        }
    }
}

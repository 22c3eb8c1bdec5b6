//! Guardrail interceptors: pre-execution hooks that may allow or override a
//! planned action.
//!
//! Input guardrails inspect the incoming message once, before the root stage;
//! tool guardrails inspect every tool invocation. Both are pure functions of
//! their inputs and must be side-effect-free on Allow.

mod input;
mod tool;

pub use input::OrderSafetyGuardrail;
pub use tool::StatusTransitionGuardrail;

use serde::{Deserialize, Serialize};

/// Decision of an input guardrail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDecision {
    /// Let the run proceed.
    Allow,
    /// Terminate the run before any stage executes; the carried text becomes
    /// the run's output.
    Block(String),
}

impl InputDecision {
    /// Returns true if the decision allows the run.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decision of a tool guardrail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolDecision {
    /// Execute the tool normally.
    Allow,
    /// Skip execution and use the carried value as the tool result. Final
    /// for that invocation.
    Substitute(serde_json::Value),
}

impl ToolDecision {
    /// Returns true if the decision allows execution.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// A pre-run check over the pipeline's incoming message.
pub trait InputGuardrail: Send + Sync {
    /// Returns the guardrail's name, used in diagnostics.
    fn name(&self) -> &str;

    /// Inspects the incoming message.
    fn inspect(&self, message: &str) -> InputDecision;
}

/// A pre-execution check over a single tool invocation.
pub trait ToolGuardrail: Send + Sync {
    /// Returns the guardrail's name, used in diagnostics.
    fn name(&self) -> &str;

    /// Inspects a tool call before it runs.
    fn inspect(&self, tool_name: &str, args: &serde_json::Value) -> ToolDecision;
}

/// Policy knobs for the shipped guardrails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Case-insensitive substrings that block a message outright.
    pub banned_keywords: Vec<String>,
    /// Largest plausible order quantity; bigger bare numbers block.
    pub quantity_threshold: u64,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            banned_keywords: ["DROP TABLE", "DELETE FROM", "HACK", "EXPLODE"]
                .into_iter()
                .map(String::from)
                .collect(),
            quantity_threshold: 50,
        }
    }
}

impl GuardrailConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the banned keyword set.
    #[must_use]
    pub fn with_banned_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.banned_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the quantity threshold.
    #[must_use]
    pub fn with_quantity_threshold(mut self, threshold: u64) -> Self {
        self.quantity_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_predicates() {
        assert!(InputDecision::Allow.is_allow());
        assert!(!InputDecision::Block("no".into()).is_allow());
        assert!(ToolDecision::Allow.is_allow());
        assert!(!ToolDecision::Substitute(serde_json::json!({})).is_allow());
    }

    #[test]
    fn default_config() {
        let config = GuardrailConfig::default();
        assert_eq!(config.quantity_threshold, 50);
        assert!(config.banned_keywords.contains(&"HACK".to_string()));
    }

    #[test]
    fn config_builders() {
        let config = GuardrailConfig::new()
            .with_quantity_threshold(10)
            .with_banned_keywords(["SPAM"]);

        assert_eq!(config.quantity_threshold, 10);
        assert_eq!(config.banned_keywords, vec!["SPAM".to_string()]);
    }
}

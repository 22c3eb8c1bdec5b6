//! The default input safety policy.

use super::{GuardrailConfig, InputDecision, InputGuardrail};
use regex::Regex;
use tracing::{debug, info};

/// Rejects unsafe or implausible order messages before any stage runs.
///
/// Two checks, in order:
/// 1. banned keywords, matched case-insensitively as substrings;
/// 2. a quantity plausibility check - monetary amounts (`$12.99`) and
///    duration phrases (`35 minutes`) are stripped first so their digits are
///    not mistaken for quantities, then the largest remaining integer is
///    compared against the configured threshold. No numbers means allow.
pub struct OrderSafetyGuardrail {
    config: GuardrailConfig,
    price_re: Regex,
    duration_re: Regex,
    number_re: Regex,
}

impl OrderSafetyGuardrail {
    /// Creates the guardrail with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GuardrailConfig::default())
    }

    /// Creates the guardrail with a custom policy.
    #[must_use]
    #[allow(clippy::unwrap_used)] // fixed, known-valid patterns
    pub fn with_config(config: GuardrailConfig) -> Self {
        Self {
            config,
            price_re: Regex::new(r"\$\d+(?:\.\d+)?").unwrap(),
            duration_re: Regex::new(r"(?i)\d+\s*(?:min|mins|minutes|hour)").unwrap(),
            number_re: Regex::new(r"\d+").unwrap(),
        }
    }

    fn max_quantity(&self, message: &str) -> Option<u64> {
        let cleaned = self.price_re.replace_all(message, "");
        let cleaned = self.duration_re.replace_all(&cleaned, "");

        let max = self
            .number_re
            .find_iter(&cleaned)
            .filter_map(|m| m.as_str().parse::<u64>().ok())
            .max();

        if let Some(n) = max {
            debug!(cleaned = %cleaned, max = n, "quantity check extracted numbers");
        }
        max
    }
}

impl Default for OrderSafetyGuardrail {
    fn default() -> Self {
        Self::new()
    }
}

impl InputGuardrail for OrderSafetyGuardrail {
    fn name(&self) -> &str {
        "order_safety_guardrail"
    }

    fn inspect(&self, message: &str) -> InputDecision {
        let upper = message.to_uppercase();
        if self
            .config
            .banned_keywords
            .iter()
            .any(|bad| upper.contains(&bad.to_uppercase()))
        {
            info!("blocking message containing banned keyword");
            return InputDecision::Block("Unsafe input detected.".to_string());
        }

        if let Some(max) = self.max_quantity(message) {
            if max > self.config.quantity_threshold {
                info!(max, "blocking implausibly large order");
                return InputDecision::Block(format!(
                    "This order quantity ({max}) seems unusually large. \
                     Please confirm or split it."
                ));
            }
        }

        InputDecision::Allow
    }
}

//! Loop validators.
//!
//! A validator is a pure predicate over the shared state, run after each loop
//! iteration. Malformed or absent state is simply invalid, never a panic.

use crate::state::SharedState;

/// Accepts or rejects the state after a loop iteration.
pub trait Validator: Send + Sync {
    /// Returns the validator's name, used in reports.
    fn name(&self) -> &str;

    /// Checks the state. Must never panic; anything unexpected is `false`.
    fn validate(&self, state: &SharedState) -> bool;
}

/// Valid when the key holds a non-null, non-empty value.
pub struct KeyPresenceValidator {
    key: String,
}

impl KeyPresenceValidator {
    /// Creates a presence check for a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Validator for KeyPresenceValidator {
    fn name(&self) -> &str {
        "key_presence"
    }

    fn validate(&self, state: &SharedState) -> bool {
        match state.get(&self.key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }
}

/// Valid when the key holds a map containing every required field.
pub struct RequiredFieldsValidator {
    key: String,
    required: Vec<String>,
}

impl RequiredFieldsValidator {
    /// Creates a field check for a key.
    #[must_use]
    pub fn new<I, S>(key: impl Into<String>, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for RequiredFieldsValidator {
    fn name(&self) -> &str {
        "required_fields"
    }

    fn validate(&self, state: &SharedState) -> bool {
        match state.get(&self.key) {
            Some(serde_json::Value::Object(map)) => {
                self.required.iter().all(|field| map.contains_key(field))
            }
            _ => false,
        }
    }
}

/// Valid when the key holds a non-empty map whose every value is a
/// non-negative number.
pub struct NonNegativeNumbersValidator {
    key: String,
}

impl NonNegativeNumbersValidator {
    /// Creates a non-negative stock check for a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Validator for NonNegativeNumbersValidator {
    fn name(&self) -> &str {
        "non_negative_numbers"
    }

    fn validate(&self, state: &SharedState) -> bool {
        match state.get(&self.key) {
            Some(serde_json::Value::Object(map)) => {
                !map.is_empty()
                    && map
                        .values()
                        .all(|v| v.as_f64().map_or(false, |n| n >= 0.0))
            }
            _ => false,
        }
    }
}

/// The loyalty update check: `loyalty_update` must carry user, points, and
/// status fields.
#[must_use]
pub fn loyalty_validator() -> RequiredFieldsValidator {
    RequiredFieldsValidator::new("loyalty_update", ["user_id", "updated_points", "status"])
}

/// The inventory check: every `updated_inventory` count must be a
/// non-negative number.
#[must_use]
pub fn inventory_validator() -> NonNegativeNumbersValidator {
    NonNegativeNumbersValidator::new("updated_inventory")
}

/// The feedback check: `feedback_analysis` must carry the user and text.
#[must_use]
pub fn feedback_validator() -> RequiredFieldsValidator {
    RequiredFieldsValidator::new("feedback_analysis", ["user_id", "text"])
}

/// The refinement check: `refinement_suggestions` must carry suggestions.
#[must_use]
pub fn refinement_validator() -> RequiredFieldsValidator {
    RequiredFieldsValidator::new("refinement_suggestions", ["suggestions"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_rejects_missing_null_and_empty() {
        let state = SharedState::new();
        let validator = KeyPresenceValidator::new("forecast_output");

        assert!(!validator.validate(&state));

        state.set("forecast_output", serde_json::Value::Null);
        assert!(!validator.validate(&state));

        state.set("forecast_output", serde_json::json!(""));
        assert!(!validator.validate(&state));

        state.set("forecast_output", serde_json::json!({"forecast": []}));
        assert!(validator.validate(&state));
    }

    #[test]
    fn loyalty_requires_all_fields() {
        let state = SharedState::new();
        let validator = loyalty_validator();

        state.set(
            "loyalty_update",
            serde_json::json!({"user_id": "CUST-1", "updated_points": 15}),
        );
        assert!(!validator.validate(&state));

        state.set(
            "loyalty_update",
            serde_json::json!({
                "user_id": "CUST-1",
                "updated_points": 15,
                "status": "ok",
            }),
        );
        assert!(validator.validate(&state));
    }

    #[test]
    fn loyalty_rejects_prose_output() {
        let state = SharedState::new();
        state.set(
            "loyalty_update",
            serde_json::json!("I awarded 15 points to the customer."),
        );
        assert!(!loyalty_validator().validate(&state));
    }

    #[test]
    fn inventory_rejects_negative_counts() {
        let state = SharedState::new();
        let validator = inventory_validator();

        state.set("updated_inventory", serde_json::json!({"buns": 4, "patties": 0}));
        assert!(validator.validate(&state));

        state.set("updated_inventory", serde_json::json!({"buns": -1}));
        assert!(!validator.validate(&state));

        state.set("updated_inventory", serde_json::json!({"buns": "many"}));
        assert!(!validator.validate(&state));

        state.set("updated_inventory", serde_json::json!({}));
        assert!(!validator.validate(&state));
    }

    #[test]
    fn refinement_requires_suggestions_field() {
        let state = SharedState::new();
        let validator = refinement_validator();

        state.set("refinement_suggestions", serde_json::json!({"notes": "n/a"}));
        assert!(!validator.validate(&state));

        state.set(
            "refinement_suggestions",
            serde_json::json!({"suggestions": ["bundle fries with burgers"]}),
        );
        assert!(validator.validate(&state));
    }
}

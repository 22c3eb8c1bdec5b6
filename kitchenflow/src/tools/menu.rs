//! Menu lookup over a JSON menu file.

use super::storage::read_json_or;
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Serves the restaurant menu to order-taking units.
///
/// Unlike the stores, a missing menu file is an error rather than an empty
/// default: a kitchen with no menu cannot take orders.
pub struct MenuTool {
    path: PathBuf,
}

impl MenuTool {
    /// Creates the tool over the given menu file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Tool for MenuTool {
    fn name(&self) -> &str {
        "get_menu"
    }

    fn description(&self) -> &str {
        "Fetches the menu items available for ordering"
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        if !self.path.exists() {
            return Err(ToolError::storage(
                self.name(),
                format!("menu not found at {}", self.path.display()),
            ));
        }
        read_json_or(&self.path, self.name(), serde_json::json!({}))
    }
}

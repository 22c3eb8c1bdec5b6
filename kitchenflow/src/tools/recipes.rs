//! Ingredient requirements lookup over a JSON recipe book.

use super::storage::{read_json_or, require_str};
use super::{OrderStore, Tool};
use crate::errors::ToolError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves an order to the ingredient list of its first item.
///
/// Recipes are keyed by item name in the backing file. Unknown orders and
/// items without a recipe resolve to an empty object, like an order lookup
/// miss.
pub struct RecipeBook {
    path: PathBuf,
    orders: Arc<OrderStore>,
}

impl RecipeBook {
    /// Creates the recipe book over the given file and order store.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, orders: Arc<OrderStore>) -> Self {
        Self {
            path: path.into(),
            orders,
        }
    }
}

#[async_trait]
impl Tool for RecipeBook {
    fn name(&self) -> &str {
        "get_ingredient_requirements"
    }

    fn description(&self) -> &str {
        "Looks up the ingredient list for an order's first item"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let order_id = require_str(&args, "order_id", self.name())?;

        let Some(order) = self.orders.find(self.name(), order_id)? else {
            return Ok(serde_json::json!({}));
        };
        let Some(first_item) = order
            .get("items")
            .and_then(|v| v.as_array())
            .and_then(|items| items.first())
            .and_then(|item| item.get("name"))
            .and_then(|v| v.as_str())
        else {
            return Ok(serde_json::json!({}));
        };

        let recipes = read_json_or(&self.path, self.name(), serde_json::json!({}))?;
        Ok(recipes
            .get(first_item)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }
}

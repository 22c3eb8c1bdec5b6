//! Inventory tools over a JSON stock file.

use super::storage::{read_json_or, require_i64, require_str, write_json};
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// File-backed inventory store. The backing file maps item names to
/// non-negative stock counts.
pub struct InventoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl InventoryStore {
    /// Creates a store over the given inventory file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the inventory tools backed by this store.
    #[must_use]
    pub fn tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(FetchInventory(Arc::clone(self))),
            Arc::new(UpdateInventoryChanges(Arc::clone(self))),
            Arc::new(TriggerLowStockAlert),
        ]
    }

    fn load(&self, tool: &str) -> Result<serde_json::Map<String, serde_json::Value>, ToolError> {
        let value = read_json_or(&self.path, tool, serde_json::json!({}))?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }
}

struct FetchInventory(Arc<InventoryStore>);

#[async_trait]
impl Tool for FetchInventory {
    fn name(&self) -> &str {
        "fetch_inventory"
    }

    fn description(&self) -> &str {
        "Loads the current stock map"
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let _guard = self.0.lock.lock();
        Ok(serde_json::Value::Object(self.0.load(self.name())?))
    }
}

struct UpdateInventoryChanges(Arc<InventoryStore>);

#[async_trait]
impl Tool for UpdateInventoryChanges {
    fn name(&self) -> &str {
        "update_inventory_changes"
    }

    fn description(&self) -> &str {
        "Adds or deducts stock for one item, clamped at zero"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let item = require_str(&args, "item", self.name())?.to_string();
        let qty = require_i64(&args, "qty", self.name())?;

        let _guard = self.0.lock.lock();
        let mut inventory = self.0.load(self.name())?;
        let current = inventory
            .get(&item)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        let updated = (current + qty).max(0);
        inventory.insert(item.clone(), serde_json::json!(updated));
        write_json(
            &self.0.path,
            self.name(),
            &serde_json::Value::Object(inventory),
        )?;

        Ok(serde_json::json!({ "item": item, "updated_qty": updated }))
    }
}

struct TriggerLowStockAlert;

#[async_trait]
impl Tool for TriggerLowStockAlert {
    fn name(&self) -> &str {
        "trigger_low_stock_alert"
    }

    fn description(&self) -> &str {
        "Raises a low-stock alert for one item"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let item = require_str(&args, "item", self.name())?;
        warn!(item, "low stock alert");
        Ok(serde_json::json!({
            "alert": true,
            "item": item,
            "message": "Low stock detected",
        }))
    }
}

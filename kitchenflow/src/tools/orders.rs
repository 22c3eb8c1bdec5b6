//! Order management tools over a JSON order file.

use super::storage::{read_json_or, require_str, write_json};
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// File-backed order store.
///
/// The backing file holds a JSON array of order objects. All read-modify-write
/// cycles are serialized behind a lock so concurrent tool calls cannot tear
/// the file.
pub struct OrderStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OrderStore {
    /// Creates a store over the given order file. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the order tools backed by this store.
    #[must_use]
    pub fn tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(SaveNewOrder(Arc::clone(self))),
            Arc::new(GetOrderDetails(Arc::clone(self))),
            Arc::new(UpdateOrderStatus(Arc::clone(self))),
            Arc::new(FetchPendingOrders(Arc::clone(self))),
        ]
    }

    fn load(&self, tool: &str) -> Result<Vec<serde_json::Value>, ToolError> {
        let value = read_json_or(&self.path, tool, serde_json::json!([]))?;
        match value {
            serde_json::Value::Array(orders) => Ok(orders),
            _ => Ok(Vec::new()),
        }
    }

    fn save(&self, tool: &str, orders: Vec<serde_json::Value>) -> Result<(), ToolError> {
        write_json(&self.path, tool, &serde_json::Value::Array(orders))
    }

    /// Looks an order up by id, on behalf of the named tool.
    pub(crate) fn find(
        &self,
        tool: &str,
        order_id: &str,
    ) -> Result<Option<serde_json::Value>, ToolError> {
        let _guard = self.lock.lock();
        let orders = self.load(tool)?;
        Ok(orders
            .into_iter()
            .find(|o| o.get("order_id").and_then(|v| v.as_str()) == Some(order_id)))
    }
}

struct SaveNewOrder(Arc<OrderStore>);

#[async_trait]
impl Tool for SaveNewOrder {
    fn name(&self) -> &str {
        "save_new_order"
    }

    fn description(&self) -> &str {
        "Creates a structured order with generated ids and persists it"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let items = args
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ToolError::invalid_arguments(self.name(), "missing array field 'items'")
            })?;

        let order_id = format!("ORD-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
            .to_uppercase();
        let customer_id = format!("CUST-{}", &uuid::Uuid::new_v4().simple().to_string()[..6])
            .to_uppercase();

        let order_items: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "item_id": format!(
                        "ITEM-{}",
                        &uuid::Uuid::new_v4().simple().to_string()[..4]
                    ),
                    "name": item.get("name").cloned()
                        .unwrap_or_else(|| serde_json::json!("Unknown")),
                    "quantity": item.get("quantity").cloned()
                        .unwrap_or_else(|| serde_json::json!(1)),
                    "addons": item.get("addons").cloned()
                        .unwrap_or_else(|| serde_json::json!([])),
                })
            })
            .collect();

        let order = serde_json::json!({
            "order_id": order_id,
            "customer_id": customer_id,
            "customer_name": args.get("customer_name").cloned()
                .unwrap_or_else(|| serde_json::json!("Guest")),
            "table": args.get("table_number").cloned()
                .unwrap_or(serde_json::Value::Null),
            "num_people": args.get("num_people").cloned()
                .unwrap_or(serde_json::Value::Null),
            "time": chrono::Utc::now().to_rfc3339(),
            "estimated_arrival": args.get("eta").cloned()
                .unwrap_or_else(|| serde_json::json!("now")),
            "status": "QUEUED",
            "loyalty_points_awarded": 0,
            "items": order_items,
        });

        let _guard = self.0.lock.lock();
        let mut orders = self.0.load(self.name())?;
        orders.push(order.clone());
        self.0.save(self.name(), orders)?;

        info!(order_id = %order["order_id"], "saved new order");
        Ok(serde_json::json!({ "order": order }))
    }
}

struct GetOrderDetails(Arc<OrderStore>);

#[async_trait]
impl Tool for GetOrderDetails {
    fn name(&self) -> &str {
        "get_order_details"
    }

    fn description(&self) -> &str {
        "Fetches one order by id; empty object when not found"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let order_id = require_str(&args, "order_id", self.name())?;
        let found = self.0.find(self.name(), order_id)?;
        Ok(found.unwrap_or_else(|| serde_json::json!({})))
    }
}

struct UpdateOrderStatus(Arc<OrderStore>);

#[async_trait]
impl Tool for UpdateOrderStatus {
    fn name(&self) -> &str {
        "update_order_status"
    }

    fn description(&self) -> &str {
        "Moves an order to a new status"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let order_id = require_str(&args, "order_id", self.name())?.to_string();
        let status = require_str(&args, "status", self.name())?.to_string();

        let _guard = self.0.lock.lock();
        let mut orders = self.0.load(self.name())?;
        let mut updated = false;
        for order in &mut orders {
            if order.get("order_id").and_then(|v| v.as_str()) == Some(order_id.as_str()) {
                order["status"] = serde_json::json!(status);
                updated = true;
                break;
            }
        }
        self.0.save(self.name(), orders)?;

        Ok(serde_json::json!({
            "updated": updated,
            "order_id": order_id,
            "new_status": status,
        }))
    }
}

struct FetchPendingOrders(Arc<OrderStore>);

#[async_trait]
impl Tool for FetchPendingOrders {
    fn name(&self) -> &str {
        "fetch_pending_orders"
    }

    fn description(&self) -> &str {
        "Lists all orders not yet completed"
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let _guard = self.0.lock.lock();
        let orders = self.0.load(self.name())?;
        let pending: Vec<serde_json::Value> = orders
            .into_iter()
            .filter(|o| {
                o.get("status")
                    .and_then(|v| v.as_str())
                    .map_or(true, |s| !s.eq_ignore_ascii_case("completed"))
            })
            .collect();
        Ok(serde_json::json!({ "pending_orders": pending }))
    }
}

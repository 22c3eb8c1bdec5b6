//! Loyalty tools over a JSON points file.

use super::storage::{read_json_or, require_i64, require_str, write_json};
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// File-backed loyalty store. The backing file maps user ids to point totals.
pub struct LoyaltyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LoyaltyStore {
    /// Creates a store over the given loyalty file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the loyalty tools backed by this store.
    #[must_use]
    pub fn tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(FetchLoyaltyProfile(Arc::clone(self))),
            Arc::new(UpdateLoyaltyPoints(Arc::clone(self))),
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

struct FetchLoyaltyProfile(Arc<LoyaltyStore>);

#[async_trait]
impl Tool for FetchLoyaltyProfile {
    fn name(&self) -> &str {
        "fetch_loyalty_profile"
    }

    fn description(&self) -> &str {
        "Looks up a user's loyalty point total"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let user_id = require_str(&args, "user_id", self.name())?;

        let _guard = self.0.lock.lock();
        let profiles = self.0.load(self.name())?;
        let points = profiles
            .get(user_id)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        Ok(serde_json::json!({ "user_id": user_id, "points": points }))
    }
}

struct UpdateLoyaltyPoints(Arc<LoyaltyStore>);

#[async_trait]
impl Tool for UpdateLoyaltyPoints {
    fn name(&self) -> &str {
        "update_loyalty_points"
    }

    fn description(&self) -> &str {
        "Adds points to a user's total"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let user_id = require_str(&args, "user_id", self.name())?.to_string();
        let points = require_i64(&args, "points", self.name())?;

        let _guard = self.0.lock.lock();
        let mut profiles = self.0.load(self.name())?;
        let total = profiles
            .get(&user_id)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
            + points;
        profiles.insert(user_id.clone(), serde_json::json!(total));
        write_json(
            &self.0.path,
            self.name(),
            &serde_json::Value::Object(profiles),
        )?;

        Ok(serde_json::json!({ "user_id": user_id, "points": total }))
    }
}

//! Tools: named external functions work units may invoke with structured
//! arguments.

mod dispatch;
mod feedback;
mod forecast;
mod inventory;
mod loyalty;
mod menu;
mod orders;
mod recipes;
mod storage;
mod system;

pub use dispatch::ToolDispatcher;
pub use feedback::FeedbackLog;
pub use forecast::SalesForecastTool;
pub use inventory::InventoryStore;
pub use loyalty::LoyaltyStore;
pub use menu::MenuTool;
pub use orders::OrderStore;
pub use recipes::RecipeBook;
pub use system::SystemLog;

use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A named external function callable with structured arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's name.
    fn name(&self) -> &str;

    /// Returns a short description of what the tool does.
    fn description(&self) -> &str {
        ""
    }

    /// Executes the tool.
    ///
    /// # Errors
    ///
    /// Returns a `ToolError` describing bad arguments, storage failures, or
    /// execution failures. Errors are fed back to the requesting executor as
    /// structured values, never escalated to the enclosing stage.
    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// Registry mapping tool names to implementations.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its own name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.write().insert(name, tool);
    }

    /// Gets a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// Checks if a tool is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Lists registered tool names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Returns true if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.read().len())
            .finish()
    }
}

/// How one tool invocation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationDisposition {
    /// The guardrails allowed it and the tool ran.
    Executed,
    /// A guardrail substituted the result; the tool did not run.
    Substituted,
    /// The call never reached a tool (undeclared, unknown, or the tool
    /// errored); a structured error value was fed back instead.
    Errored,
}

/// Record of one gated tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The requesting work unit.
    pub unit: String,
    /// The tool name.
    pub tool: String,
    /// The argument map.
    pub args: serde_json::Value,
    /// How the call was resolved.
    pub disposition: InvocationDisposition,
    /// The result value fed back to the executor.
    pub result: serde_json::Value,
}

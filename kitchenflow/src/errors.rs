//! Error types for the kitchenflow pipeline core.
//!
//! The taxonomy separates the executor capability (transient vs. permanent),
//! tool execution, and pipeline-level failures. Guardrail blocks are not
//! errors: a blocked run and a substituted tool result are both ordinary
//! outcomes surfaced through reports.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for kitchenflow operations.
#[derive(Debug, Error)]
pub enum KitchenflowError {
    /// The executor capability failed.
    #[error("{0}")]
    Executor(#[from] ExecutorError),

    /// A tool-related error.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// The pipeline definition is invalid.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// The run was cancelled.
    #[error("Run cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the external executor capability.
///
/// Transient failures are retryable conditions (network, rate limit) but the
/// core applies no automatic retry beyond loop validation; inside a leaf both
/// variants are fatal to the enclosing stage.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// A retryable condition such as a rate limit or network hiccup.
    #[error("transient executor failure: {0}")]
    Transient(String),

    /// A non-retryable failure.
    #[error("permanent executor failure: {0}")]
    Permanent(String),
}

impl ExecutorError {
    /// Returns true if the failure is a retryable condition.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors related to tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Tool was not found in the registry.
    #[error("Tool not found: {name}")]
    NotFound {
        /// The tool name.
        name: String,
    },

    /// The work unit did not declare the tool in its surface.
    #[error("Tool not declared: '{name}' is outside the tool surface of unit '{unit}'")]
    NotDeclared {
        /// The tool name.
        name: String,
        /// The requesting work unit.
        unit: String,
    },

    /// The arguments did not match what the tool expects.
    #[error("Invalid arguments for tool '{name}': {reason}")]
    InvalidArguments {
        /// The tool name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// Backing storage for a file-backed tool failed.
    #[error("Storage failure in tool '{name}': {reason}")]
    Storage {
        /// The tool name.
        name: String,
        /// The underlying failure.
        reason: String,
    },

    /// Tool execution failed.
    #[error("Tool execution failed: {name} - {reason}")]
    ExecutionFailed {
        /// The tool name.
        name: String,
        /// The reason for failure.
        reason: String,
    },
}

impl ToolError {
    /// Creates a tool not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an undeclared-tool error.
    #[must_use]
    pub fn not_declared(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::NotDeclared {
            name: name.into(),
            unit: unit.into(),
        }
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Converts to a structured result value suitable for feeding back to the
    /// executor in place of a tool result.
    #[must_use]
    pub fn to_result_value(&self) -> serde_json::Value {
        let kind = match self {
            Self::NotFound { .. } => "ToolNotFound",
            Self::NotDeclared { .. } => "ToolNotDeclared",
            Self::InvalidArguments { .. } => "ToolInvalidArguments",
            Self::Storage { .. } => "ToolStorageError",
            Self::ExecutionFailed { .. } => "ToolExecutionError",
        };
        serde_json::json!({
            "status": "error",
            "type": kind,
            "error_message": self.to_string(),
        })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::NotFound { name } => {
                map.insert("type".to_string(), serde_json::json!("ToolNotFound"));
                map.insert("name".to_string(), serde_json::json!(name));
            }
            Self::NotDeclared { name, unit } => {
                map.insert("type".to_string(), serde_json::json!("ToolNotDeclared"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("unit".to_string(), serde_json::json!(unit));
            }
            Self::InvalidArguments { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("ToolInvalidArguments"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Storage { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("ToolStorageError"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::ExecutionFailed { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("ToolExecutionError"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

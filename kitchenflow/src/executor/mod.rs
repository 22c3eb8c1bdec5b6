//! The work unit executor capability.
//!
//! In production this seam is typically an LLM call. The core only depends on
//! the contract: given an instruction, a state snapshot, and the declared
//! tool surface, the executor either produces a final output value or asks
//! for tool calls to be run first. Control flow is carried by the tagged
//! reply, never by free-text convention.

use crate::state::StateSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::errors::ExecutorError;

/// A tool call requested by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The tool name.
    pub name: String,
    /// The argument map.
    pub args: serde_json::Value,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    #[must_use]
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// The result of one gated tool call, fed back to the executor on the next
/// round. Substituted and errored calls arrive through the same channel as
/// executed ones; the `result` value carries the distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The tool name.
    pub name: String,
    /// The result value (tool output, guardrail substitution, or structured
    /// error).
    pub result: serde_json::Value,
}

/// One invocation request handed to the executor.
#[derive(Debug, Clone)]
pub struct ExecutorRequest {
    /// The requesting work unit's name.
    pub unit: String,
    /// The unit's instruction payload (opaque to the core).
    pub instruction: String,
    /// The blackboard as of this round.
    pub state: StateSnapshot,
    /// Tool names the unit may invoke.
    pub available_tools: Vec<String>,
    /// Results of the previous round's tool calls, empty on the first round.
    pub tool_results: Vec<ToolCallResult>,
}

/// The executor's reply for one round.
#[derive(Debug, Clone)]
pub enum ExecutorReply {
    /// The final output value for the work unit.
    Output(serde_json::Value),
    /// Tools to run before the executor can answer.
    ToolCalls(Vec<ToolCallRequest>),
}

impl ExecutorReply {
    /// Returns true if this reply is a final output.
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output(_))
    }
}

/// The external execution capability consumed by the runner.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes one round for a work unit.
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::Transient` for retryable conditions and
    /// `ExecutorError::Permanent` otherwise. The runner treats both as fatal
    /// to the enclosing stage; retry, if any, comes from loop validation.
    async fn invoke(&self, request: ExecutorRequest) -> Result<ExecutorReply, ExecutorError>;
}

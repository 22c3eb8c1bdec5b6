//! Hand-rolled mocks: a scripted executor, a failing executor, and a
//! recording tool.

use crate::errors::{ExecutorError, ToolError};
use crate::executor::{Executor, ExecutorReply, ExecutorRequest};
use crate::tools::Tool;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// An executor that replays scripted replies per work unit.
///
/// Each `invoke` pops the next scripted reply for the requesting unit. Units
/// without a script (or with an exhausted one) get a default output object
/// naming the unit, so whole-pipeline tests only script the units they care
/// about. Every request is recorded for assertions.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<Result<ExecutorReply, ExecutorError>>>>,
    requests: Mutex<Vec<ExecutorRequest>>,
}

impl ScriptedExecutor {
    /// Creates an executor with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the replies for one unit, consumed in order.
    #[must_use]
    pub fn script(
        self,
        unit: impl Into<String>,
        replies: Vec<Result<ExecutorReply, ExecutorError>>,
    ) -> Self {
        self.scripts
            .lock()
            .insert(unit.into(), replies.into_iter().collect());
        self
    }

    /// Scripts a single output value for one unit.
    #[must_use]
    pub fn script_output(self, unit: impl Into<String>, value: serde_json::Value) -> Self {
        self.script(unit, vec![Ok(ExecutorReply::Output(value))])
    }

    /// Returns all recorded requests.
    #[must_use]
    pub fn requests(&self) -> Vec<ExecutorRequest> {
        self.requests.lock().clone()
    }

    /// Returns recorded requests for one unit.
    #[must_use]
    pub fn requests_for(&self, unit: &str) -> Vec<ExecutorRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.unit == unit)
            .cloned()
            .collect()
    }

    /// Returns how many times `invoke` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn invoke(&self, request: ExecutorRequest) -> Result<ExecutorReply, ExecutorError> {
        let unit = request.unit.clone();
        self.requests.lock().push(request);

        let scripted = self
            .scripts
            .lock()
            .get_mut(&unit)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(reply) => reply,
            None => Ok(ExecutorReply::Output(serde_json::json!({ "from": unit }))),
        }
    }
}

/// An executor that always fails.
pub struct FailingExecutor {
    message: String,
}

impl FailingExecutor {
    /// Creates a failing executor with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Executor for FailingExecutor {
    async fn invoke(&self, _request: ExecutorRequest) -> Result<ExecutorReply, ExecutorError> {
        Err(ExecutorError::Permanent(self.message.clone()))
    }
}

/// A tool that returns a fixed value and records its calls.
pub struct RecordingTool {
    name: String,
    result: serde_json::Value,
    calls: Mutex<Vec<serde_json::Value>>,
}

impl RecordingTool {
    /// Creates a recording tool returning a fixed result.
    #[must_use]
    pub fn new(name: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the recorded argument values.
    #[must_use]
    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().clone()
    }

    /// Returns how many times the tool was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        self.calls.lock().push(args);
        Ok(self.result.clone())
    }
}

//! Work units: the atomic executable step wrapped by a leaf stage.

use serde::{Deserialize, Serialize};

/// An atomic unit of work executed by a leaf stage.
///
/// The instruction payload is opaque to the core; the declared output key and
/// tool surface are the contract the runner enforces. A unit writes exactly
/// one state key and may only invoke the tools it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    /// The unit name (also used as the leaf stage name).
    pub name: String,
    /// The state key this unit's result is written to.
    pub output_key: String,
    /// The instruction payload handed to the executor.
    pub instruction: String,
    /// Names of tools the unit may invoke. Empty means none.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl WorkUnit {
    /// Creates a new work unit.
    #[must_use]
    pub fn new(name: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_key: output_key.into(),
            instruction: String::new(),
            tools: Vec::new(),
        }
    }

    /// Sets the instruction payload.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Declares the tool surface.
    #[must_use]
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Checks whether a tool is in the declared surface.
    #[must_use]
    pub fn declares_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }
}

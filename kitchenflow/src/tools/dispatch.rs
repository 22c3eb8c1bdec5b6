//! Gated tool dispatch.
//!
//! Every tool call requested by an executor passes through three gates in
//! order: the declared tool surface of the requesting work unit, the tool
//! guardrail chain, and registry lookup. Failures at any gate are answered
//! with a structured error value fed back to the executor; they never
//! escalate to the enclosing stage.

use super::{InvocationDisposition, Tool, ToolInvocation, ToolRegistry};
use crate::errors::ToolError;
use crate::events::{EventSink, RunEvent};
use crate::executor::{ToolCallRequest, ToolCallResult};
use crate::guardrails::{ToolDecision, ToolGuardrail};
use crate::work::WorkUnit;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves tool call requests through the surface check, the guardrail
/// chain, and the registry.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    guardrails: Vec<Arc<dyn ToolGuardrail>>,
    events: Arc<dyn EventSink>,
}

impl ToolDispatcher {
    /// Creates a dispatcher over a registry.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        guardrails: Vec<Arc<dyn ToolGuardrail>>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            guardrails,
            events,
        }
    }

    /// Resolves one tool call for a work unit.
    ///
    /// Returns the result to feed back to the executor and the invocation
    /// record for diagnostics.
    pub async fn dispatch(
        &self,
        unit: &WorkUnit,
        call: &ToolCallRequest,
    ) -> (ToolCallResult, ToolInvocation) {
        if !unit.declares_tool(&call.name) {
            warn!(
                unit = %unit.name,
                tool = %call.name,
                "tool call outside the declared surface"
            );
            let err = ToolError::not_declared(&call.name, &unit.name);
            return self.errored(unit, call, &err);
        }

        for guard in &self.guardrails {
            if let ToolDecision::Substitute(value) = guard.inspect(&call.name, &call.args) {
                debug!(
                    unit = %unit.name,
                    tool = %call.name,
                    guardrail = guard.name(),
                    "tool result substituted by guardrail"
                );
                self.events.try_emit(RunEvent::ToolSubstituted {
                    unit: unit.name.clone(),
                    tool: call.name.clone(),
                    guardrail: guard.name().to_string(),
                });
                return self.resolved(unit, call, InvocationDisposition::Substituted, value);
            }
        }

        let Some(tool) = self.registry.get(&call.name) else {
            let err = ToolError::not_found(&call.name);
            return self.errored(unit, call, &err);
        };

        self.execute(unit, call, tool).await
    }

    async fn execute(
        &self,
        unit: &WorkUnit,
        call: &ToolCallRequest,
        tool: Arc<dyn Tool>,
    ) -> (ToolCallResult, ToolInvocation) {
        match tool.call(call.args.clone()).await {
            Ok(value) => {
                self.events.try_emit(RunEvent::ToolInvoked {
                    unit: unit.name.clone(),
                    tool: call.name.clone(),
                });
                self.resolved(unit, call, InvocationDisposition::Executed, value)
            }
            Err(err) => {
                warn!(unit = %unit.name, tool = %call.name, error = %err, "tool failed");
                self.errored(unit, call, &err)
            }
        }
    }

    fn errored(
        &self,
        unit: &WorkUnit,
        call: &ToolCallRequest,
        err: &ToolError,
    ) -> (ToolCallResult, ToolInvocation) {
        self.resolved(
            unit,
            call,
            InvocationDisposition::Errored,
            err.to_result_value(),
        )
    }

    fn resolved(
        &self,
        unit: &WorkUnit,
        call: &ToolCallRequest,
        disposition: InvocationDisposition,
        result: serde_json::Value,
    ) -> (ToolCallResult, ToolInvocation) {
        let invocation = ToolInvocation {
            unit: unit.name.clone(),
            tool: call.name.clone(),
            args: call.args.clone(),
            disposition,
            result: result.clone(),
        };
        let call_result = ToolCallResult {
            name: call.name.clone(),
            result,
        };
        (call_result, invocation)
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", &self.registry)
            .field("guardrail_count", &self.guardrails.len())
            .finish_non_exhaustive()
    }
}

//! The pipeline runner.
//!
//! Walks the stage tree against a fresh blackboard: leaves drive the executor
//! round loop with gated tool dispatch, sequential stages halt on the first
//! fatal child, parallel stages fan out and complete with failures, loops
//! retry their body until the validator accepts the state or the iteration
//! budget runs out.

#[cfg(test)]
mod integration_tests;

use crate::cancellation::CancellationToken;
use crate::core::{Diagnostics, FailureRecord, RunOutcome, RunReport, StageReport, StageStatus};
use crate::events::{EventSink, NoOpEventSink, RunEvent};
use crate::executor::{Executor, ExecutorReply, ExecutorRequest, ToolCallResult};
use crate::guardrails::{InputDecision, InputGuardrail, ToolGuardrail};
use crate::stage::Stage;
use crate::state::SharedState;
use crate::tools::{ToolDispatcher, ToolInvocation, ToolRegistry};
use crate::work::WorkUnit;
use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The state key the initial message is stored under.
pub const USER_MESSAGE_KEY: &str = "user_message";

/// A named stage tree with a designated output key.
#[derive(Debug)]
pub struct Pipeline {
    /// The pipeline name.
    pub name: String,
    /// The root stage.
    pub root: Stage,
    /// The state key whose value becomes the run output.
    pub output_key: String,
}

impl Pipeline {
    /// Creates a new pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>, root: Stage, output_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root,
            output_key: output_key.into(),
        }
    }
}

/// Runner policy knobs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Executor invocations allowed per leaf before the unit fails.
    pub max_tool_rounds: u32,
    /// Wall-clock budget for the whole run.
    pub timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            timeout: None,
        }
    }
}

impl RunnerConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-leaf executor round budget. Clamped to at least 1.
    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    /// Sets the run timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Executes pipelines against an executor, a tool registry, and guardrails.
pub struct PipelineRunner {
    executor: Arc<dyn Executor>,
    tools: Arc<ToolRegistry>,
    input_guardrails: Vec<Arc<dyn InputGuardrail>>,
    tool_guardrails: Vec<Arc<dyn ToolGuardrail>>,
    events: Arc<dyn EventSink>,
    config: RunnerConfig,
}

impl PipelineRunner {
    /// Creates a runner over an executor with no tools, no guardrails, and
    /// default config. Registering a guardrail is what enables it.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            tools: Arc::new(ToolRegistry::new()),
            input_guardrails: Vec::new(),
            tool_guardrails: Vec::new(),
            events: Arc::new(NoOpEventSink),
            config: RunnerConfig::default(),
        }
    }

    /// Sets the tool registry.
    #[must_use]
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Appends an input guardrail to the chain.
    #[must_use]
    pub fn with_input_guardrail(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    /// Appends a tool guardrail to the chain.
    #[must_use]
    pub fn with_tool_guardrail(mut self, guardrail: Arc<dyn ToolGuardrail>) -> Self {
        self.tool_guardrails.push(guardrail);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the runner config.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a pipeline to completion with a fresh cancellation token.
    pub async fn run(&self, pipeline: &Pipeline, initial_message: &str) -> RunReport {
        self.run_with_cancellation(pipeline, initial_message, Arc::new(CancellationToken::new()))
            .await
    }

    /// Runs a pipeline under an externally held cancellation token.
    pub async fn run_with_cancellation(
        &self,
        pipeline: &Pipeline,
        initial_message: &str,
        token: Arc<CancellationToken>,
    ) -> RunReport {
        let started = Instant::now();
        self.events
            .emit(RunEvent::RunStarted {
                pipeline: pipeline.name.clone(),
            })
            .await;

        for guardrail in &self.input_guardrails {
            if let InputDecision::Block(replacement) = guardrail.inspect(initial_message) {
                info!(guardrail = guardrail.name(), "run blocked by input guardrail");
                self.events
                    .emit(RunEvent::RunBlocked {
                        pipeline: pipeline.name.clone(),
                        guardrail: guardrail.name().to_string(),
                    })
                    .await;
                return RunReport {
                    outcome: RunOutcome::Blocked,
                    output: Some(serde_json::Value::String(replacement)),
                    final_state: std::collections::HashMap::new(),
                    root: None,
                    diagnostics: Diagnostics {
                        blocked_by: Some(guardrail.name().to_string()),
                        ..Diagnostics::default()
                    },
                    duration_ms: elapsed_ms(started),
                };
            }
        }

        let ctx = RunContext {
            state: SharedState::new(),
            token: Arc::clone(&token),
            dispatcher: ToolDispatcher::new(
                Arc::clone(&self.tools),
                self.tool_guardrails.clone(),
                Arc::clone(&self.events),
            ),
            unvalidated: Mutex::new(Vec::new()),
            invocations: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        };
        ctx.state.set(
            USER_MESSAGE_KEY,
            serde_json::Value::String(initial_message.to_string()),
        );

        let root = match self.config.timeout {
            Some(budget) => {
                match tokio::time::timeout(budget, self.execute_stage(&ctx, &pipeline.root)).await
                {
                    Ok(report) => Some(report),
                    Err(_) => {
                        token.cancel("run timeout elapsed");
                        None
                    }
                }
            }
            None => Some(self.execute_stage(&ctx, &pipeline.root).await),
        };

        let outcome = match &root {
            None => RunOutcome::Cancelled,
            Some(report) => match report.status {
                StageStatus::Cancelled => RunOutcome::Cancelled,
                StageStatus::Fail => RunOutcome::Failed,
                StageStatus::Ok => RunOutcome::Success,
            },
        };
        let output = match outcome {
            RunOutcome::Success => ctx.state.get(&pipeline.output_key),
            _ => None,
        };

        if outcome == RunOutcome::Cancelled {
            self.events
                .emit(RunEvent::RunCancelled {
                    pipeline: pipeline.name.clone(),
                    reason: token.reason(),
                })
                .await;
        }
        self.events
            .emit(RunEvent::RunCompleted {
                pipeline: pipeline.name.clone(),
                outcome,
            })
            .await;

        RunReport {
            outcome,
            output,
            final_state: ctx.state.to_dict(),
            root,
            diagnostics: Diagnostics {
                blocked_by: None,
                unvalidated_loops: ctx.unvalidated.into_inner(),
                failures: ctx.failures.into_inner(),
                tool_invocations: ctx.invocations.into_inner(),
                cancel_reason: token.reason(),
            },
            duration_ms: elapsed_ms(started),
        }
    }

    fn execute_stage<'a>(
        &'a self,
        ctx: &'a RunContext,
        stage: &'a Stage,
    ) -> BoxFuture<'a, StageReport> {
        async move {
            if ctx.token.is_cancelled() {
                return StageReport::cancelled(stage.name(), ctx.cancel_reason());
            }
            self.events.try_emit(RunEvent::StageStarted {
                stage: stage.name().to_string(),
            });

            let report = match stage {
                Stage::Leaf(unit) => self.run_leaf(ctx, unit).await,
                Stage::Sequential { name, children } => {
                    self.run_sequential(ctx, name, children).await
                }
                Stage::Parallel { name, children } => {
                    self.run_parallel(ctx, name, children).await
                }
                Stage::Loop {
                    name,
                    body,
                    validator,
                    max_iterations,
                } => {
                    self.run_loop(ctx, name, body, validator.as_ref(), *max_iterations)
                        .await
                }
            };

            self.events.try_emit(match report.status {
                StageStatus::Ok => RunEvent::StageCompleted {
                    stage: report.stage.clone(),
                },
                status => RunEvent::StageFailed {
                    stage: report.stage.clone(),
                    status,
                },
            });
            report
        }
        .boxed()
    }

    async fn run_leaf(&self, ctx: &RunContext, unit: &WorkUnit) -> StageReport {
        let mut tool_results: Vec<ToolCallResult> = Vec::new();

        for _round in 0..self.config.max_tool_rounds {
            if ctx.token.is_cancelled() {
                return StageReport::cancelled(&unit.name, ctx.cancel_reason());
            }

            let request = ExecutorRequest {
                unit: unit.name.clone(),
                instruction: unit.instruction.clone(),
                state: ctx.state.snapshot(),
                available_tools: unit.tools.clone(),
                tool_results: std::mem::take(&mut tool_results),
            };

            match self.executor.invoke(request).await {
                Ok(ExecutorReply::Output(value)) => {
                    ctx.state.set(&unit.output_key, value);
                    return StageReport::ok(&unit.name);
                }
                Ok(ExecutorReply::ToolCalls(calls)) => {
                    for call in &calls {
                        let (result, invocation) = ctx.dispatcher.dispatch(unit, call).await;
                        ctx.invocations.lock().push(invocation);
                        tool_results.push(result);
                    }
                }
                Err(err) => {
                    warn!(unit = %unit.name, error = %err, "executor failed");
                    ctx.failures
                        .lock()
                        .push(FailureRecord::new(&unit.name, err.to_string()));
                    return StageReport::fail(&unit.name, err.to_string());
                }
            }
        }

        let message = format!(
            "tool round budget ({}) exhausted without an output",
            self.config.max_tool_rounds
        );
        ctx.failures
            .lock()
            .push(FailureRecord::new(&unit.name, &message));
        StageReport::fail(&unit.name, message)
    }

    async fn run_sequential(
        &self,
        ctx: &RunContext,
        name: &str,
        children: &[Stage],
    ) -> StageReport {
        let mut reports = Vec::with_capacity(children.len());

        for child in children {
            let report = self.execute_stage(ctx, child).await;
            let halted = !report.is_success();
            reports.push(report);

            if halted {
                // reports is non-empty here
                let last = &reports[reports.len() - 1];
                let parent = match last.status {
                    StageStatus::Cancelled => {
                        StageReport::cancelled(name, ctx.cancel_reason())
                    }
                    _ => StageReport::fail(
                        name,
                        format!("child stage '{}' failed", last.stage),
                    ),
                };
                return parent.with_children(reports);
            }
        }

        StageReport::ok(name).with_children(reports)
    }

    async fn run_parallel(&self, ctx: &RunContext, name: &str, children: &[Stage]) -> StageReport {
        let reports = join_all(
            children
                .iter()
                .map(|child| self.execute_stage(ctx, child)),
        )
        .await;

        let cancelled = reports
            .iter()
            .any(|r| r.status == StageStatus::Cancelled);
        let failures: Vec<FailureRecord> = reports
            .iter()
            .filter(|r| r.status == StageStatus::Fail)
            .map(|r| {
                FailureRecord::new(
                    &r.stage,
                    r.error.clone().unwrap_or_else(|| "failed".to_string()),
                )
            })
            .collect();

        if cancelled {
            return StageReport::cancelled(name, ctx.cancel_reason()).with_children(reports);
        }
        // A failed child never fails the group; the group completes and
        // carries the failure records.
        StageReport::ok(name)
            .with_failures(failures)
            .with_children(reports)
    }

    async fn run_loop(
        &self,
        ctx: &RunContext,
        name: &str,
        body: &Stage,
        validator: &dyn crate::stage::Validator,
        max_iterations: u32,
    ) -> StageReport {
        let mut body_reports = Vec::new();

        for iteration in 1..=max_iterations {
            let report = self.execute_stage(ctx, body).await;
            let status = report.status;
            body_reports.push(report);

            match status {
                StageStatus::Cancelled => {
                    return StageReport::cancelled(name, ctx.cancel_reason())
                        .with_children(body_reports);
                }
                StageStatus::Fail => {
                    return StageReport::fail(
                        name,
                        format!("loop body failed on iteration {iteration}"),
                    )
                    .with_children(body_reports);
                }
                StageStatus::Ok => {}
            }

            if validator.validate(&ctx.state) {
                return StageReport::ok(name)
                    .with_loop_result(iteration, true)
                    .with_children(body_reports);
            }
        }

        // Exhausted: keep the last (invalid) output but surface the miss.
        warn!(stage = name, max_iterations, "loop exhausted without validating");
        self.events.try_emit(RunEvent::LoopExhausted {
            stage: name.to_string(),
            iterations: max_iterations,
        });
        ctx.unvalidated.lock().push(name.to_string());
        StageReport::ok(name)
            .with_loop_result(max_iterations, false)
            .with_children(body_reports)
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("tools", &self.tools)
            .field("input_guardrails", &self.input_guardrails.len())
            .field("tool_guardrails", &self.tool_guardrails.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct RunContext {
    state: SharedState,
    token: Arc<CancellationToken>,
    dispatcher: ToolDispatcher,
    unvalidated: Mutex<Vec<String>>,
    invocations: Mutex<Vec<ToolInvocation>>,
    failures: Mutex<Vec<FailureRecord>>,
}

impl RunContext {
    fn cancel_reason(&self) -> String {
        self.token
            .reason()
            .unwrap_or_else(|| "cancelled".to_string())
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

//! Whole-run tests over scripted executors.

use super::*;
use crate::errors::ExecutorError;
use crate::events::{CollectingEventSink, RunEvent};
use crate::executor::ToolCallRequest;
use crate::guardrails::{OrderSafetyGuardrail, StatusTransitionGuardrail};
use crate::stage::{KeyPresenceValidator, Validator};
use crate::testing::mocks::{RecordingTool, ScriptedExecutor};
use crate::work::WorkUnit;
use pretty_assertions::assert_eq;

struct AlwaysInvalid;

impl Validator for AlwaysInvalid {
    fn name(&self) -> &str {
        "always_invalid"
    }

    fn validate(&self, _state: &SharedState) -> bool {
        false
    }
}

fn leaf(name: &str, output_key: &str) -> Stage {
    Stage::leaf(WorkUnit::new(name, output_key))
}

#[tokio::test]
async fn blocked_run_executes_zero_stages() {
    let executor = Arc::new(ScriptedExecutor::new());
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>)
        .with_input_guardrail(Arc::new(OrderSafetyGuardrail::new()));
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let report = runner.run(&pipeline, "I want 75 burgers").await;

    assert_eq!(report.outcome, RunOutcome::Blocked);
    assert!(report
        .output
        .as_ref()
        .and_then(|v| v.as_str())
        .unwrap()
        .contains("75"));
    assert!(report.root.is_none());
    assert_eq!(
        report.diagnostics.blocked_by.as_deref(),
        Some("order_safety_guardrail")
    );
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn banned_keyword_blocks_with_fixed_text() {
    let runner = PipelineRunner::new(Arc::new(ScriptedExecutor::new()))
        .with_input_guardrail(Arc::new(OrderSafetyGuardrail::new()));
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let report = runner.run(&pipeline, "please HACK the register").await;

    assert_eq!(report.outcome, RunOutcome::Blocked);
    assert_eq!(
        report.output,
        Some(serde_json::json!("Unsafe input detected."))
    );
}

#[tokio::test]
async fn ordinary_order_is_not_blocked() {
    let runner = PipelineRunner::new(Arc::new(ScriptedExecutor::new()))
        .with_input_guardrail(Arc::new(OrderSafetyGuardrail::new()));
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let report = runner
        .run(&pipeline, "Burger $12.99, ready in 35 minutes")
        .await;

    assert_eq!(report.outcome, RunOutcome::Success);
}

#[tokio::test]
async fn loop_stops_after_first_valid_iteration() {
    let executor = Arc::new(ScriptedExecutor::new());
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::retry_until_valid(
            "loyalty_loop",
            leaf("loyalty_agent", "loyalty_update"),
            Arc::new(KeyPresenceValidator::new("loyalty_update")),
        ),
        "loyalty_update",
    );

    let report = runner.run(&pipeline, "order done").await;

    assert_eq!(report.outcome, RunOutcome::Success);
    let root = report.root.unwrap();
    assert_eq!(root.iterations, 1);
    assert_eq!(root.validated, Some(true));
    assert_eq!(executor.call_count(), 1);
    assert!(report.diagnostics.unvalidated_loops.is_empty());
}

#[tokio::test]
async fn exhausted_loop_keeps_last_output_and_is_flagged() {
    let executor = Arc::new(ScriptedExecutor::new());
    let sink = Arc::new(CollectingEventSink::new());
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>)
        .with_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::retry_until_valid(
            "refinement_loop",
            leaf("refinement_agent", "refinement_suggestions"),
            Arc::new(AlwaysInvalid),
        ),
        "refinement_suggestions",
    );

    let report = runner.run(&pipeline, "enrich").await;

    // The run still succeeds; the miss is surfaced in metadata only.
    assert_eq!(report.outcome, RunOutcome::Success);
    assert!(report.output.is_some());
    let root = report.root.unwrap();
    assert_eq!(root.iterations, 3);
    assert_eq!(root.validated, Some(false));
    assert_eq!(executor.call_count(), 3);
    assert_eq!(
        report.diagnostics.unvalidated_loops,
        vec!["refinement_loop".to_string()]
    );
    assert_eq!(
        sink.of_kind("loop.exhausted"),
        vec![RunEvent::LoopExhausted {
            stage: "refinement_loop".into(),
            iterations: 3,
        }]
    );
}

#[tokio::test]
async fn parallel_child_failure_does_not_stop_siblings() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .script(
                "forecasting_agent",
                vec![Err(ExecutorError::Permanent("model offline".into()))],
            )
            .script_output("storekeeper_agent", serde_json::json!({"buns": 10}))
            .script_output("loyalty_agent", serde_json::json!({"points": 5})),
    );
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::parallel(
            "background_enrichment",
            vec![
                leaf("forecasting_agent", "forecast_output"),
                leaf("storekeeper_agent", "updated_inventory"),
                leaf("loyalty_agent", "loyalty_update"),
            ],
        ),
        "updated_inventory",
    );

    let report = runner.run(&pipeline, "enrich").await;

    assert_eq!(report.outcome, RunOutcome::Success);
    assert_eq!(report.state_value("updated_inventory").unwrap()["buns"], 10);
    assert_eq!(report.state_value("loyalty_update").unwrap()["points"], 5);
    assert!(report.state_value("forecast_output").is_none());

    let root = report.root.unwrap();
    assert_eq!(root.status, StageStatus::Ok);
    assert_eq!(root.failures.len(), 1);
    assert_eq!(root.failures[0].stage, "forecasting_agent");
    assert_eq!(report.diagnostics.failures.len(), 1);
}

#[tokio::test]
async fn sequential_halts_on_first_failure() {
    let executor = Arc::new(ScriptedExecutor::new().script(
        "queuing_agent",
        vec![Err(ExecutorError::Permanent("no queue".into()))],
    ));
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::sequential(
            "order_flow",
            vec![
                leaf("order_loader_agent", "order"),
                leaf("queuing_agent", "queue_assignment"),
                leaf("notifier_agent", "chef_alert"),
            ],
        ),
        "chef_alert",
    );

    let report = runner.run(&pipeline, "order up").await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report.output.is_none());
    assert!(executor.requests_for("notifier_agent").is_empty());
    let root = report.root.unwrap();
    assert_eq!(root.status, StageStatus::Fail);
    assert_eq!(root.children.len(), 2);
}

#[tokio::test]
async fn later_writer_wins_the_shared_key() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .script_output("first_writer", serde_json::json!("draft"))
            .script_output("second_writer", serde_json::json!("final")),
    );
    let runner = PipelineRunner::new(executor);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::sequential(
            "writers",
            vec![leaf("first_writer", "note"), leaf("second_writer", "note")],
        ),
        "note",
    );

    let report = runner.run(&pipeline, "go").await;

    assert_eq!(report.outcome, RunOutcome::Success);
    assert_eq!(report.output, Some(serde_json::json!("final")));
}

#[tokio::test]
async fn fired_token_yields_cancelled_with_no_output() {
    let executor = Arc::new(ScriptedExecutor::new());
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>);
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let token = Arc::new(CancellationToken::new());
    token.cancel("operator abort");
    let report = runner
        .run_with_cancellation(&pipeline, "order up", token)
        .await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.output.is_none());
    assert_eq!(
        report.diagnostics.cancel_reason.as_deref(),
        Some("operator abort")
    );
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn substituted_tool_result_reaches_next_round() {
    let tool = Arc::new(RecordingTool::new(
        "update_order_status",
        serde_json::json!({"updated": true}),
    ));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::clone(&tool) as Arc<dyn crate::tools::Tool>);

    let executor = Arc::new(ScriptedExecutor::new().script(
        "expeditor_agent",
        vec![
            Ok(ExecutorReply::ToolCalls(vec![ToolCallRequest::new(
                "update_order_status",
                serde_json::json!({"order_id": "ORD-1", "status": "BURNED"}),
            )])),
            Ok(ExecutorReply::Output(serde_json::json!({"handled": true}))),
        ],
    ));
    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>)
        .with_tools(registry)
        .with_tool_guardrail(Arc::new(StatusTransitionGuardrail::new()));
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::leaf(
            WorkUnit::new("expeditor_agent", "delivery_assignment")
                .with_tools(["update_order_status"]),
        ),
        "delivery_assignment",
    );

    let report = runner.run(&pipeline, "expedite ORD-1").await;

    assert_eq!(report.outcome, RunOutcome::Success);
    // The guardrail substituted; the real tool never ran.
    assert_eq!(tool.call_count(), 0);

    let second_round = &executor.requests_for("expeditor_agent")[1];
    assert_eq!(second_round.tool_results.len(), 1);
    assert_eq!(second_round.tool_results[0].result["status"], "error");

    assert_eq!(report.diagnostics.tool_invocations.len(), 1);
    assert_eq!(
        report.diagnostics.tool_invocations[0].disposition,
        crate::tools::InvocationDisposition::Substituted
    );
}

#[tokio::test]
async fn tool_round_budget_exhaustion_fails_the_leaf() {
    let call = || {
        Ok(ExecutorReply::ToolCalls(vec![ToolCallRequest::new(
            "fetch_inventory",
            serde_json::json!({}),
        )]))
    };
    let executor = Arc::new(ScriptedExecutor::new().script("storekeeper_agent", vec![call(), call()]));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(RecordingTool::new(
        "fetch_inventory",
        serde_json::json!({"buns": 1}),
    )) as Arc<dyn crate::tools::Tool>);

    let runner = PipelineRunner::new(Arc::clone(&executor) as Arc<dyn Executor>)
        .with_tools(registry)
        .with_config(RunnerConfig::new().with_max_tool_rounds(2));
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::leaf(
            WorkUnit::new("storekeeper_agent", "updated_inventory")
                .with_tools(["fetch_inventory"]),
        ),
        "updated_inventory",
    );

    let report = runner.run(&pipeline, "restock").await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    let root = report.root.unwrap();
    assert!(root.error.unwrap().contains("budget"));
}

#[tokio::test]
async fn initial_message_lands_in_state() {
    let runner = PipelineRunner::new(Arc::new(ScriptedExecutor::new()));
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let report = runner.run(&pipeline, "two burgers").await;

    assert_eq!(
        report.state_value(USER_MESSAGE_KEY),
        Some(&serde_json::json!("two burgers"))
    );
}

#[tokio::test]
async fn run_timeout_cancels_the_run() {
    struct StallingExecutor;

    #[async_trait::async_trait]
    impl Executor for StallingExecutor {
        async fn invoke(
            &self,
            _request: ExecutorRequest,
        ) -> Result<ExecutorReply, ExecutorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ExecutorReply::Output(serde_json::json!(null)))
        }
    }

    let runner = PipelineRunner::new(Arc::new(StallingExecutor))
        .with_config(RunnerConfig::new().with_timeout(Duration::from_millis(20)));
    let pipeline = Pipeline::new("kitchen", leaf("order_loader_agent", "order"), "order");

    let report = runner.run(&pipeline, "order up").await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.output.is_none());
    assert_eq!(
        report.diagnostics.cancel_reason.as_deref(),
        Some("run timeout elapsed")
    );
}

#[tokio::test]
async fn run_events_narrate_the_lifecycle() {
    let sink = Arc::new(CollectingEventSink::new());
    let runner = PipelineRunner::new(Arc::new(ScriptedExecutor::new()))
        .with_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);
    let pipeline = Pipeline::new(
        "kitchen",
        Stage::sequential("order_flow", vec![leaf("order_loader_agent", "order")]),
        "order",
    );

    runner.run(&pipeline, "order up").await;

    assert_eq!(
        sink.of_kind("run.started"),
        vec![RunEvent::RunStarted {
            pipeline: "kitchen".into(),
        }]
    );
    assert_eq!(sink.of_kind("stage.started").len(), 2);
    assert_eq!(sink.of_kind("stage.completed").len(), 2);
    assert!(sink.of_kind("stage.failed").is_empty());
    assert_eq!(
        sink.of_kind("run.completed"),
        vec![RunEvent::RunCompleted {
            pipeline: "kitchen".into(),
            outcome: RunOutcome::Success,
        }]
    );
}

//! # Kitchenflow
//!
//! A pipeline orchestration core for multi-unit workflows over a shared
//! blackboard, modeled on an automated restaurant kitchen.
//!
//! Kitchenflow provides:
//!
//! - **Stage composition**: sequential, parallel, and validation-gated loop
//!   stages over atomic work units
//! - **Shared state**: a keyed blackboard with last-write-wins semantics and
//!   immutable snapshots
//! - **Guardrails**: input interceptors that can block a run before it starts
//!   and tool interceptors that can substitute a tool's result
//! - **Gated tool dispatch**: declared tool surfaces per work unit, with
//!   errors fed back to the executor instead of failing the stage
//! - **Run reports**: per-stage results, diagnostics, and an event stream
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kitchenflow::prelude::*;
//!
//! let runner = PipelineRunner::new(executor)
//!     .with_tools(kitchen_tools(data_dir))
//!     .with_input_guardrail(Arc::new(OrderSafetyGuardrail::new()))
//!     .with_tool_guardrail(Arc::new(StatusTransitionGuardrail::new()));
//!
//! let report = runner.run(&kitchen_pipeline(), "Two burgers, one cola").await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod core;
pub mod errors;
pub mod events;
pub mod executor;
pub mod guardrails;
pub mod observability;
pub mod runner;
pub mod stage;
pub mod state;
pub mod testing;
pub mod tools;
pub mod topology;
pub mod work;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{
        Diagnostics, FailureRecord, RunOutcome, RunReport, StageReport, StageStatus,
    };
    pub use crate::errors::{ExecutorError, KitchenflowError, ToolError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RunEvent,
    };
    pub use crate::executor::{
        Executor, ExecutorReply, ExecutorRequest, ToolCallRequest, ToolCallResult,
    };
    pub use crate::guardrails::{
        GuardrailConfig, InputDecision, InputGuardrail, OrderSafetyGuardrail,
        StatusTransitionGuardrail, ToolDecision, ToolGuardrail,
    };
    pub use crate::runner::{Pipeline, PipelineRunner, RunnerConfig};
    pub use crate::stage::{Stage, Validator};
    pub use crate::state::{SharedState, StateSnapshot};
    pub use crate::tools::{Tool, ToolInvocation, ToolRegistry};
    pub use crate::topology::{kitchen_pipeline, kitchen_tools};
    pub use crate::work::WorkUnit;
}

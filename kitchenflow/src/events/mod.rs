//! Run events and sinks.
//!
//! The runner narrates each run as a stream of typed [`RunEvent`]s delivered
//! to an [`EventSink`]. Sinks must never fail the run; delivery is best
//! effort.

use crate::core::{RunOutcome, StageStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

/// One observable moment in a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A run began.
    RunStarted {
        /// The pipeline name.
        pipeline: String,
    },
    /// An input guardrail rejected the run before any stage executed.
    RunBlocked {
        /// The pipeline name.
        pipeline: String,
        /// The blocking guardrail.
        guardrail: String,
    },
    /// A stage began executing.
    StageStarted {
        /// The stage name.
        stage: String,
    },
    /// A stage completed.
    StageCompleted {
        /// The stage name.
        stage: String,
    },
    /// A stage failed or observed cancellation.
    StageFailed {
        /// The stage name.
        stage: String,
        /// The terminal status.
        status: StageStatus,
    },
    /// A loop ran out of iterations without validating.
    LoopExhausted {
        /// The loop stage name.
        stage: String,
        /// How many times the body ran.
        iterations: u32,
    },
    /// A gated tool call executed.
    ToolInvoked {
        /// The requesting work unit.
        unit: String,
        /// The tool name.
        tool: String,
    },
    /// A guardrail substituted a tool result; the tool did not run.
    ToolSubstituted {
        /// The requesting work unit.
        unit: String,
        /// The tool name.
        tool: String,
        /// The substituting guardrail.
        guardrail: String,
    },
    /// The run was cancelled.
    RunCancelled {
        /// The pipeline name.
        pipeline: String,
        /// The cancellation reason, if one was given.
        reason: Option<String>,
    },
    /// The run reached a terminal outcome.
    RunCompleted {
        /// The pipeline name.
        pipeline: String,
        /// The terminal outcome.
        outcome: RunOutcome,
    },
}

impl RunEvent {
    /// Returns the dotted event kind, e.g. `"stage.started"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::RunBlocked { .. } => "run.blocked",
            Self::StageStarted { .. } => "stage.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::LoopExhausted { .. } => "loop.exhausted",
            Self::ToolInvoked { .. } => "tool.invoked",
            Self::ToolSubstituted { .. } => "tool.substituted",
            Self::RunCancelled { .. } => "run.cancelled",
            Self::RunCompleted { .. } => "run.completed",
        }
    }
}

/// Receives run events for observability, logging, or analytics.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event asynchronously.
    async fn emit(&self, event: RunEvent);

    /// Delivers an event without blocking. Must never raise.
    fn try_emit(&self, event: RunEvent);
}

/// A sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: RunEvent) {}

    fn try_emit(&self, _event: RunEvent) {}
}

/// A sink that logs events through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event: &RunEvent) {
        match self.level {
            Level::DEBUG => {
                debug!(event = ?event, "event: {}", event.kind());
            }
            _ => {
                info!(event = ?event, "event: {}", event.kind());
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: RunEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: RunEvent) {
        self.log_event(&event);
    }
}

/// A sink that collects events for test assertions.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<RunEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose kind starts with the given prefix, so
    /// `of_kind("stage.")` matches starts and completions alike.
    #[must_use]
    pub fn of_kind(&self, prefix: &str) -> Vec<RunEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind().starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: RunEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: RunEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_sink_accepts_everything() {
        let sink = NoOpEventSink;
        sink.emit(RunEvent::RunStarted {
            pipeline: "kitchen".into(),
        })
        .await;
        sink.try_emit(RunEvent::StageStarted {
            stage: "order_flow".into(),
        });
    }

    #[tokio::test]
    async fn collecting_sink_keeps_delivery_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(RunEvent::RunStarted {
            pipeline: "kitchen".into(),
        })
        .await;
        sink.try_emit(RunEvent::StageStarted {
            stage: "order_flow".into(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "run.started");
        assert_eq!(events[1].kind(), "stage.started");
    }

    #[tokio::test]
    async fn kind_prefix_filter() {
        let sink = CollectingEventSink::new();
        sink.try_emit(RunEvent::StageStarted {
            stage: "a".into(),
        });
        sink.try_emit(RunEvent::StageCompleted {
            stage: "a".into(),
        });
        sink.try_emit(RunEvent::ToolInvoked {
            unit: "storekeeper_agent".into(),
            tool: "fetch_inventory".into(),
        });

        assert_eq!(sink.of_kind("stage.").len(), 2);
        assert_eq!(sink.of_kind("tool.invoked").len(), 1);
        assert!(sink.of_kind("run.").is_empty());
    }

    #[test]
    fn every_variant_has_a_dotted_kind() {
        let event = RunEvent::RunCompleted {
            pipeline: "kitchen".into(),
            outcome: RunOutcome::Success,
        };
        assert_eq!(event.kind(), "run.completed");

        let event = RunEvent::StageFailed {
            stage: "queuing_agent".into(),
            status: StageStatus::Fail,
        };
        assert_eq!(event.kind(), "stage.failed");
    }

    #[test]
    fn events_serialize_for_export() {
        let event = RunEvent::LoopExhausted {
            stage: "robust_loyalty_agent".into(),
            iterations: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["LoopExhausted"]["iterations"], 3);
    }
}

//! Test doubles for pipeline tests.

pub mod mocks;

pub use mocks::{FailingExecutor, RecordingTool, ScriptedExecutor};

//! Append-only system event log.

use super::storage::require_str;
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;

/// Appends operational events to a plain-text log file, one line per event.
pub struct SystemLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SystemLog {
    /// Creates the log over the given file. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Tool for SystemLog {
    fn name(&self) -> &str {
        "save_system_logs"
    }

    fn description(&self) -> &str {
        "Appends an operational event to the system log"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let event = require_str(&args, "event", self.name())?;

        let _guard = self.lock.lock();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ToolError::storage(self.name(), format!("open {}: {e}", self.path.display()))
            })?;
        writeln!(file, "{event}").map_err(|e| {
            ToolError::storage(self.name(), format!("write {}: {e}", self.path.display()))
        })?;

        Ok(serde_json::json!({ "logged": true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_logs.txt");
        let log = SystemLog::new(&path);

        let first = log
            .call(serde_json::json!({"event": "shift opened"}))
            .await
            .unwrap();
        assert_eq!(first["logged"], true);
        log.call(serde_json::json!({"event": "fryer cleaned"}))
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "shift opened\nfryer cleaned\n");
    }

    #[tokio::test]
    async fn missing_event_is_invalid_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let log = SystemLog::new(dir.path().join("system_logs.txt"));

        let err = log.call(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}

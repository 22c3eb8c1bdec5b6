//! Feedback tools over a JSON feedback log.

use super::storage::{read_json_or, require_str, write_json};
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

const POSITIVE_WORDS: &[&str] = &["good", "great", "tasty", "delicious", "excellent", "love"];

/// File-backed feedback log. The backing file holds a JSON array of entries
/// with user, text, and timestamp.
pub struct FeedbackLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FeedbackLog {
    /// Creates a log over the given feedback file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the feedback tools backed by this log.
    #[must_use]
    pub fn tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(SaveFeedback(Arc::clone(self))),
            Arc::new(LoadFeedbackHistory(Arc::clone(self))),
            Arc::new(AnalyzeFeedbackSentiment),
        ]
    }

    fn load(&self, tool: &str) -> Result<Vec<serde_json::Value>, ToolError> {
        let value = read_json_or(&self.path, tool, serde_json::json!([]))?;
        match value {
            serde_json::Value::Array(entries) => Ok(entries),
            _ => Ok(Vec::new()),
        }
    }
}

struct SaveFeedback(Arc<FeedbackLog>);

#[async_trait]
impl Tool for SaveFeedback {
    fn name(&self) -> &str {
        "save_feedback"
    }

    fn description(&self) -> &str {
        "Appends a timestamped feedback entry"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let user_id = require_str(&args, "user_id", self.name())?;
        let text = require_str(&args, "feedback", self.name())?;

        let _guard = self.0.lock.lock();
        let mut entries = self.0.load(self.name())?;
        entries.push(serde_json::json!({
            "user": user_id,
            "feedback": text,
            "time": chrono::Utc::now().to_rfc3339(),
        }));
        write_json(&self.0.path, self.name(), &serde_json::Value::Array(entries))?;

        Ok(serde_json::json!({ "saved": true }))
    }
}

struct LoadFeedbackHistory(Arc<FeedbackLog>);

#[async_trait]
impl Tool for LoadFeedbackHistory {
    fn name(&self) -> &str {
        "load_feedback_history"
    }

    fn description(&self) -> &str {
        "Returns all stored feedback entries"
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let _guard = self.0.lock.lock();
        Ok(serde_json::Value::Array(self.0.load(self.name())?))
    }
}

struct AnalyzeFeedbackSentiment;

#[async_trait]
impl Tool for AnalyzeFeedbackSentiment {
    fn name(&self) -> &str {
        "analyze_feedback_sentiment"
    }

    fn description(&self) -> &str {
        "Scores feedback text with a keyword heuristic"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let text = require_str(&args, "text", self.name())?.to_lowercase();
        let score = if POSITIVE_WORDS.iter().any(|w| text.contains(w)) {
            1
        } else {
            -1
        };
        Ok(serde_json::json!({ "sentiment_score": score }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools_in(dir: &tempfile::TempDir) -> Vec<Arc<dyn Tool>> {
        Arc::new(FeedbackLog::new(dir.path().join("feedback.json"))).tools()
    }

    fn tool<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> &'a Arc<dyn Tool> {
        tools.iter().find(|t| t.name() == name).unwrap()
    }

    #[tokio::test]
    async fn saved_feedback_appears_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let tools = tools_in(&dir);

        tool(&tools, "save_feedback")
            .call(serde_json::json!({"user_id": "CUST-1", "feedback": "great fries"}))
            .await
            .unwrap();

        let history = tool(&tools, "load_feedback_history")
            .call(serde_json::json!({}))
            .await
            .unwrap();
        let entries = history.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["user"], "CUST-1");
        assert!(entries[0]["time"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn sentiment_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let tools = tools_in(&dir);
        let sentiment = tool(&tools, "analyze_feedback_sentiment");

        let good = sentiment
            .call(serde_json::json!({"text": "The burger was GOOD"}))
            .await
            .unwrap();
        assert_eq!(good["sentiment_score"], 1);

        let bad = sentiment
            .call(serde_json::json!({"text": "cold and slow"}))
            .await
            .unwrap();
        assert_eq!(bad["sentiment_score"], -1);
    }
}

//! Sales forecast tool over a JSON sales history file.

use super::storage::read_json_or;
use super::Tool;
use crate::errors::ToolError;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::path::PathBuf;

const DEFAULT_PERIODS: u64 = 7;
const MAX_PERIODS: u64 = 365;

/// Linear sales forecaster.
///
/// Reads a history of `{"ds": "YYYY-MM-DD", "y": number}` points, takes the
/// daily change between the last two points, and extrapolates it over the
/// requested number of future days.
pub struct SalesForecastTool {
    path: PathBuf,
}

impl SalesForecastTool {
    /// Creates the tool over the given sales history file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_history(&self) -> Result<Vec<(NaiveDate, f64)>, ToolError> {
        if !self.path.exists() {
            return Err(ToolError::storage(
                self.name(),
                format!("sales history not found at {}", self.path.display()),
            ));
        }
        let value = read_json_or(&self.path, self.name(), serde_json::json!([]))?;
        let entries = value.as_array().ok_or_else(|| {
            ToolError::storage(self.name(), "sales history must be a JSON array")
        })?;

        let mut points = Vec::with_capacity(entries.len());
        for entry in entries {
            let ds = entry.get("ds").and_then(|v| v.as_str()).ok_or_else(|| {
                ToolError::storage(self.name(), "history entry missing 'ds' date")
            })?;
            let date = NaiveDate::parse_from_str(ds, "%Y-%m-%d").map_err(|e| {
                ToolError::storage(self.name(), format!("bad date '{ds}': {e}"))
            })?;
            let y = entry.get("y").and_then(serde_json::Value::as_f64).ok_or_else(|| {
                ToolError::storage(self.name(), "history entry missing numeric 'y'")
            })?;
            points.push((date, y));
        }
        points.sort_by_key(|(date, _)| *date);
        Ok(points)
    }
}

#[async_trait]
impl Tool for SalesForecastTool {
    fn name(&self) -> &str {
        "run_sales_forecast"
    }

    fn description(&self) -> &str {
        "Extrapolates sales over future days from the recorded history"
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let periods = args
            .get("periods")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(DEFAULT_PERIODS);
        if periods == 0 || periods > MAX_PERIODS {
            return Err(ToolError::invalid_arguments(
                self.name(),
                format!("periods must be between 1 and {MAX_PERIODS}"),
            ));
        }

        let points = self.load_history()?;
        if points.len() < 2 {
            return Err(ToolError::execution_failed(
                self.name(),
                "not enough data points to forecast",
            ));
        }

        let (last_date, last_value) = points[points.len() - 1];
        let (_, second_last_value) = points[points.len() - 2];
        let daily_change = last_value - second_last_value;

        let mut forecast = Vec::with_capacity(usize::try_from(periods).unwrap_or(0));
        let mut current = last_value;
        for i in 1..=periods {
            let next_date = last_date.checked_add_days(Days::new(i)).ok_or_else(|| {
                ToolError::execution_failed(self.name(), "forecast date out of range")
            })?;
            current += daily_change;
            forecast.push(serde_json::json!({
                "ds": next_date.format("%Y-%m-%d").to_string(),
                "yhat": current,
            }));
        }

        Ok(serde_json::json!({ "forecast": forecast }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_history(dir: &tempfile::TempDir, entries: serde_json::Value) -> SalesForecastTool {
        let path = dir.path().join("sales_history.json");
        std::fs::write(&path, entries.to_string()).unwrap();
        SalesForecastTool::new(path)
    }

    #[tokio::test]
    async fn extrapolates_linearly_with_default_periods() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_history(
            &dir,
            serde_json::json!([
                {"ds": "2026-08-01", "y": 100.0},
                {"ds": "2026-08-02", "y": 110.0},
            ]),
        );

        let result = tool.call(serde_json::json!({})).await.unwrap();
        let forecast = result["forecast"].as_array().unwrap();

        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0]["ds"], "2026-08-03");
        assert!((forecast[0]["yhat"].as_f64().unwrap() - 120.0).abs() < f64::EPSILON);
        assert!((forecast[6]["yhat"].as_f64().unwrap() - 180.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unsorted_history_uses_latest_two_points() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_history(
            &dir,
            serde_json::json!([
                {"ds": "2026-08-03", "y": 90.0},
                {"ds": "2026-08-01", "y": 100.0},
                {"ds": "2026-08-02", "y": 95.0},
            ]),
        );

        let result = tool.call(serde_json::json!({"periods": 1})).await.unwrap();
        let forecast = result["forecast"].as_array().unwrap();
        assert_eq!(forecast[0]["ds"], "2026-08-04");
        assert!((forecast[0]["yhat"].as_f64().unwrap() - 85.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn short_history_is_an_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_history(&dir, serde_json::json!([{"ds": "2026-08-01", "y": 1.0}]));

        let err = tool.call(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn out_of_range_periods_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_history(
            &dir,
            serde_json::json!([
                {"ds": "2026-08-01", "y": 100.0},
                {"ds": "2026-08-02", "y": 110.0},
            ]),
        );

        for periods in [serde_json::json!(0), serde_json::json!(u64::MAX)] {
            let err = tool
                .call(serde_json::json!({"periods": periods}))
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments { .. }));
        }

        let result = tool.call(serde_json::json!({"periods": 365})).await.unwrap();
        assert_eq!(result["forecast"].as_array().unwrap().len(), 365);
    }

    #[tokio::test]
    async fn missing_history_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SalesForecastTool::new(dir.path().join("nope.json"));

        let err = tool.call(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Storage { .. }));
    }
}

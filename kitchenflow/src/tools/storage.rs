//! Shared JSON file helpers for the file-backed stores.

use crate::errors::ToolError;
use std::path::Path;

/// Reads and parses a JSON file, mapping failures to a storage error for the
/// named tool. A missing file yields the provided default.
pub(crate) fn read_json_or(
    path: &Path,
    tool: &str,
    default: serde_json::Value,
) -> Result<serde_json::Value, ToolError> {
    if !path.exists() {
        return Ok(default);
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| ToolError::storage(tool, format!("read {}: {e}", path.display())))?;
    if text.trim().is_empty() {
        return Ok(default);
    }
    serde_json::from_str(&text)
        .map_err(|e| ToolError::storage(tool, format!("parse {}: {e}", path.display())))
}

/// Serializes a value to a JSON file, pretty-printed like the upstream data
/// files.
pub(crate) fn write_json(
    path: &Path,
    tool: &str,
    value: &serde_json::Value,
) -> Result<(), ToolError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::storage(tool, format!("serialize: {e}")))?;
    std::fs::write(path, text)
        .map_err(|e| ToolError::storage(tool, format!("write {}: {e}", path.display())))
}

/// Extracts a required string argument.
pub(crate) fn require_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
    tool: &str,
) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::invalid_arguments(tool, format!("missing string field '{key}'")))
}

/// Extracts a required integer argument.
pub(crate) fn require_i64(
    args: &serde_json::Value,
    key: &str,
    tool: &str,
) -> Result<i64, ToolError> {
    args.get(key)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| ToolError::invalid_arguments(tool, format!("missing integer field '{key}'")))
}

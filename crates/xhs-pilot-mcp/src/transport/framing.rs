//! Newline-delimited JSON framing.

use serde_json::Value;

use crate::types::{JsonRpcError, JsonRpcMessage, McpError, McpResult, RequestId};

pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Serialize to a single line with a trailing newline.
pub fn frame_message(value: &Value) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}

/// Error reply for input that could not be parsed far enough to know its id.
pub fn parse_failure(e: &McpError) -> Value {
    serde_json::to_value(JsonRpcError::new(RequestId::Null, e.code(), e.to_string())).unwrap_or_default()
}

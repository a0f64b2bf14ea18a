//! MCP tools. One module per tool, each exposing `definition()` and `execute()`.

pub mod check_login_status;
pub mod download_images;
pub mod favorite_feed;
pub mod get_feed_detail;
pub mod get_login_qrcode;
pub mod like_feed;
pub mod list_feeds;
pub mod post_comment_to_feed;
pub mod publish_content;
pub mod publish_with_video;
pub mod registry;
pub mod search_feeds;
pub mod user_profile;

pub use registry::ToolRegistry;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use xhs_pilot::{PilotError, PilotResult};

use crate::types::{McpError, McpResult, ToolCallResult};

pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Render an operation outcome. Cancellation stays a protocol-level error;
/// every other failure becomes an `isError` result naming its kind.
pub(crate) fn respond<T: Serialize>(action: &str, result: PilotResult<T>) -> McpResult<ToolCallResult> {
    match result {
        Ok(value) => Ok(ToolCallResult::json(&value)),
        Err(PilotError::Cancelled) => Err(McpError::RequestCancelled),
        Err(e) => Ok(failure(action, &e)),
    }
}

pub(crate) fn failure(action: &str, e: &PilotError) -> ToolCallResult {
    ToolCallResult::error(format!("{action} failed [{}]: {e}", e.kind()))
}

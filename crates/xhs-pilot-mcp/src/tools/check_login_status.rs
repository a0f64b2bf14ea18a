//! Tool: check_login_status

use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "check_login_status".to_string(),
        description: Some("Check whether the browser session is logged in to Xiaohongshu".to_string()),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

pub async fn execute(_args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    super::respond("check login status", service.check_login_status(ctx).await)
}

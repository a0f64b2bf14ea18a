//! Tool: list_feeds

use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_feeds".to_string(),
        description: Some("List the feeds recommended on the home page".to_string()),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

pub async fn execute(_args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    super::respond("list feeds", service.list_feeds(ctx).await)
}

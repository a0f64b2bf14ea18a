//! Tool: search_feeds

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct SearchParams {
    keyword: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "search_feeds".to_string(),
        description: Some("Search notes by keyword".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "keyword": { "type": "string" }
            },
            "required": ["keyword"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: SearchParams = super::parse_args(args)?;
    super::respond("search feeds", service.search_feeds(ctx, &params.keyword).await)
}

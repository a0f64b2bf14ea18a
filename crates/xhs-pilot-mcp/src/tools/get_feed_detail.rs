//! Tool: get_feed_detail. Note body, media and first page of comments.

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct DetailParams {
    feed_id: String,
    xsec_token: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_feed_detail".to_string(),
        description: Some("Get a note's content, media, counters and comments".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "feed_id": { "type": "string" },
                "xsec_token": { "type": "string", "description": "xsecToken from a feed listing" }
            },
            "required": ["feed_id", "xsec_token"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: DetailParams = super::parse_args(args)?;
    super::respond(
        "get feed detail",
        service
            .get_feed_detail(ctx, &params.feed_id, &params.xsec_token)
            .await,
    )
}

//! Tool: post_comment_to_feed

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct CommentParams {
    feed_id: String,
    xsec_token: String,
    content: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "post_comment_to_feed".to_string(),
        description: Some("Post a comment on a note".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "feed_id": { "type": "string" },
                "xsec_token": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["feed_id", "xsec_token", "content"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: CommentParams = super::parse_args(args)?;
    super::respond(
        "post comment",
        service
            .post_comment(ctx, &params.feed_id, &params.xsec_token, &params.content)
            .await,
    )
}

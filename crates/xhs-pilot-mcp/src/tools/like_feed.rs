//! Tool: like_feed. Like, or unlike with `unlike: true`. Already-applied
//! states succeed without clicking.

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct LikeParams {
    feed_id: String,
    xsec_token: String,
    #[serde(default)]
    unlike: bool,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "like_feed".to_string(),
        description: Some("Like a note, or remove the like with unlike=true".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "feed_id": { "type": "string" },
                "xsec_token": { "type": "string" },
                "unlike": { "type": "boolean", "default": false }
            },
            "required": ["feed_id", "xsec_token"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: LikeParams = super::parse_args(args)?;
    if params.unlike {
        super::respond(
            "unlike",
            service
                .unlike_feed(ctx, &params.feed_id, &params.xsec_token)
                .await,
        )
    } else {
        super::respond(
            "like",
            service
                .like_feed(ctx, &params.feed_id, &params.xsec_token)
                .await,
        )
    }
}

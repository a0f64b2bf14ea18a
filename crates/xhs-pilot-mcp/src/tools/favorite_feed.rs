//! Tool: favorite_feed

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct FavoriteParams {
    feed_id: String,
    xsec_token: String,
    #[serde(default)]
    unfavorite: bool,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "favorite_feed".to_string(),
        description: Some("Save a note to favorites, or remove it with unfavorite=true".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "feed_id": { "type": "string" },
                "xsec_token": { "type": "string" },
                "unfavorite": { "type": "boolean", "default": false }
            },
            "required": ["feed_id", "xsec_token"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: FavoriteParams = super::parse_args(args)?;
    let result = if params.unfavorite {
        service
            .unfavorite_feed(ctx, &params.feed_id, &params.xsec_token)
            .await
    } else {
        service
            .favorite_feed(ctx, &params.feed_id, &params.xsec_token)
            .await
    };
    let action = if params.unfavorite { "unfavorite" } else { "favorite" };
    super::respond(action, result)
}

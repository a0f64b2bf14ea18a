//! Tool: user_profile

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ProfileParams {
    user_id: String,
    xsec_token: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "user_profile".to_string(),
        description: Some("Get a user's basic info, follower counters and notes".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "xsec_token": { "type": "string" }
            },
            "required": ["user_id", "xsec_token"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: ProfileParams = super::parse_args(args)?;
    super::respond(
        "user profile",
        service
            .user_profile(ctx, &params.user_id, &params.xsec_token)
            .await,
    )
}

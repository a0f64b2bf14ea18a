//! Tool: publish_with_video

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService, PublishVideoRequest};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct VideoParams {
    title: String,
    content: String,
    video: String,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "publish_with_video".to_string(),
        description: Some("Publish a video note from a local video file".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "content": { "type": "string" },
                "video": { "type": "string", "description": "Absolute path of a local video file" },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["title", "content", "video"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: VideoParams = super::parse_args(args)?;
    let req = PublishVideoRequest {
        title: params.title,
        content: params.content,
        video: params.video,
        tags: params.tags,
    };
    super::respond("publish video", service.publish_video(ctx, req).await)
}

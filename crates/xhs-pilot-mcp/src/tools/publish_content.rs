//! Tool: publish_content. Post an image note.

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService, PublishRequest};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct PublishParams {
    title: String,
    content: String,
    images: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "publish_content".to_string(),
        description: Some("Publish an image note. Images may be HTTP(S) URLs or local file paths".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "At most 20 CJK characters or 40 ASCII columns" },
                "content": { "type": "string" },
                "images": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "description": "Image URLs or local paths, in display order"
                },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["title", "content", "images"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: PublishParams = super::parse_args(args)?;
    let req = PublishRequest {
        title: params.title,
        content: params.content,
        images: params.images,
        tags: params.tags,
    };
    super::respond("publish content", service.publish_content(ctx, req).await)
}

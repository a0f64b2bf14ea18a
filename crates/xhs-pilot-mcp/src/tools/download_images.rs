//! Tool: download_images. Fetch image URLs into a local directory for later publishing.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct DownloadParams {
    images: Vec<String>,
    #[serde(default)]
    save_dir: Option<PathBuf>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "download_images".to_string(),
        description: Some(
            "Download HTTP(S) images to local files. Local paths are checked and passed through".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "images": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                "save_dir": { "type": "string", "description": "Target directory; defaults to the configured images dir" }
            },
            "required": ["images"]
        }),
    }
}

pub async fn execute(args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let params: DownloadParams = super::parse_args(args)?;
    super::respond(
        "download images",
        service
            .download_images(ctx, &params.images, params.save_dir)
            .await,
    )
}

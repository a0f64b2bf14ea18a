//! Tool: get_login_qrcode. Show the QR code and keep watching for the scan
//! in the background.

use serde_json::{json, Value};
use xhs_pilot::{OpContext, PilotError, PilotService};

use crate::types::{McpError, McpResult, ToolCallResult, ToolContent, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_login_qrcode".to_string(),
        description: Some(
            "Get a login QR code to scan with the Xiaohongshu app. The session is saved once the scan completes"
                .to_string(),
        ),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

pub async fn execute(_args: Value, service: &PilotService, ctx: &OpContext) -> McpResult<ToolCallResult> {
    let response = match service.get_login_qrcode(ctx).await {
        Ok(r) => r,
        Err(PilotError::Cancelled) => return Err(McpError::RequestCancelled),
        Err(e) => return Ok(super::failure("get login qrcode", &e)),
    };

    let Some(img) = response.img else {
        return Ok(ToolCallResult::text("Already logged in, no QR code needed.".to_string()));
    };

    let deadline = chrono::Duration::from_std(service.config().timings.login_timeout)
        .ok()
        .map(|d| (chrono::Local::now() + d).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let text = format!(
        "Scan the QR code with the Xiaohongshu app within {} (until {deadline}).",
        response.timeout
    );

    match split_data_url(&img) {
        Some((mime_type, data)) => Ok(ToolCallResult::text(text).with_content(ToolContent::Image {
            data: data.to_string(),
            mime_type: mime_type.to_string(),
        })),
        None => Ok(ToolCallResult::text(format!("{text}\nQR code: {img}"))),
    }
}

/// `data:image/png;base64,AAAA` → `("image/png", "AAAA")`.
fn split_data_url(src: &str) -> Option<(&str, &str)> {
    let rest = src.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    if mime.is_empty() || data.is_empty() {
        return None;
    }
    Some((mime, data))
}

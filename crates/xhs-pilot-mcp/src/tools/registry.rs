//! Tool registration and dispatch.

use serde_json::Value;
use xhs_pilot::{OpContext, PilotService};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    check_login_status, download_images, favorite_feed, get_feed_detail, get_login_qrcode,
    like_feed, list_feeds, post_comment_to_feed, publish_content, publish_with_video,
    search_feeds, user_profile,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            check_login_status::definition(),
            get_login_qrcode::definition(),
            publish_content::definition(),
            publish_with_video::definition(),
            list_feeds::definition(),
            search_feeds::definition(),
            get_feed_detail::definition(),
            user_profile::definition(),
            post_comment_to_feed::definition(),
            like_feed::definition(),
            favorite_feed::definition(),
            download_images::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        service: &PilotService,
        ctx: &OpContext,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));
        tracing::debug!("Tool call: {name}");

        match name {
            "check_login_status" => check_login_status::execute(args, service, ctx).await,
            "get_login_qrcode" => get_login_qrcode::execute(args, service, ctx).await,
            "publish_content" => publish_content::execute(args, service, ctx).await,
            "publish_with_video" => publish_with_video::execute(args, service, ctx).await,
            "list_feeds" => list_feeds::execute(args, service, ctx).await,
            "search_feeds" => search_feeds::execute(args, service, ctx).await,
            "get_feed_detail" => get_feed_detail::execute(args, service, ctx).await,
            "user_profile" => user_profile::execute(args, service, ctx).await,
            "post_comment_to_feed" => post_comment_to_feed::execute(args, service, ctx).await,
            "like_feed" => like_feed::execute(args, service, ctx).await,
            "favorite_feed" => favorite_feed::execute(args, service, ctx).await,
            "download_images" => download_images::execute(args, service, ctx).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_unique_and_schemas_are_objects() {
        let tools = ToolRegistry::list_tools();
        let names: std::collections::HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 12);
        for tool in &tools {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        }
    }
}

//! Protocol-level tests for xhs-pilot-mcp against the scripted browser.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use xhs_pilot::platform::{self, selectors};
use xhs_pilot::{Fixture, PilotConfig, PilotService, ScriptedBrowser, ScriptedElement};
use xhs_pilot_mcp::protocol::ProtocolHandler;
use xhs_pilot_mcp::transport::StdioTransport;
use xhs_pilot_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn handler(browser: &ScriptedBrowser, dir: &tempfile::TempDir) -> ProtocolHandler {
    let mut config = PilotConfig {
        cookies_path: dir.path().join("cookies.json"),
        images_dir: dir.path().join("images"),
        ..PilotConfig::default()
    };
    config.timings.quiet_window = Duration::from_millis(50);
    config.timings.stability_poll = Duration::from_millis(10);
    config.timings.settle_delay = Duration::ZERO;
    config.timings.hydration_timeout = Duration::from_millis(500);
    config.timings.login_timeout = Duration::from_secs(5);
    let service = PilotService::new(Arc::new(browser.clone()), config);
    ProtocolHandler::new(Arc::new(service))
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

fn first_text(response: &Value) -> String {
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn search_feed(i: usize) -> Value {
    json!({
        "id": format!("note{i}"),
        "xsecToken": format!("token{i}"),
        "noteCard": { "displayTitle": format!("Trip #{i}"), "user": { "nickName": "Wanderer" } }
    })
}

// ═══════════════════════════════════════════════════════
// HANDSHAKE AND ENVELOPE
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_initialize_advertises_tools() {
    let dir = tempfile::tempdir().unwrap();
    let h = handler(&ScriptedBrowser::new(), &dir);

    let resp = send_unwrap(&h, init_request()).await;
    assert_eq!(resp["result"]["protocolVersion"], MCP_VERSION);
    assert_eq!(resp["result"]["serverInfo"]["name"], "xhs-pilot-mcp");
    assert!(resp["result"]["capabilities"]["tools"].is_object());

    let ack = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(send(&h, ack).await.is_none());
}

#[tokio::test]
async fn test_tools_list_has_every_tool() {
    let dir = tempfile::tempdir().unwrap();
    let h = handler(&ScriptedBrowser::new(), &dir);

    let resp = send_unwrap(&h, mcp_request(1, "tools/list", json!({}))).await;
    let names: Vec<&str> = resp["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in [
        "check_login_status",
        "get_login_qrcode",
        "publish_content",
        "publish_with_video",
        "list_feeds",
        "search_feeds",
        "get_feed_detail",
        "user_profile",
        "post_comment_to_feed",
        "like_feed",
        "favorite_feed",
        "download_images",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }
}

#[tokio::test]
async fn test_wrong_jsonrpc_version_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let h = handler(&ScriptedBrowser::new(), &dir);

    let resp = send_unwrap(&h, json!({ "jsonrpc": "1.0", "id": 3, "method": "ping" })).await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(resp["id"], 3);
}

#[tokio::test]
async fn test_unknown_method_and_tool() {
    let dir = tempfile::tempdir().unwrap();
    let h = handler(&ScriptedBrowser::new(), &dir);

    let resp = send_unwrap(&h, mcp_request(4, "resources/list", json!({}))).await;
    assert_eq!(resp["error"]["code"], error_codes::METHOD_NOT_FOUND);

    let resp = send_unwrap(&h, tool_call(5, "delete_account", json!({}))).await;
    assert_eq!(resp["error"]["code"], mcp_error_codes::TOOL_NOT_FOUND);
}

#[tokio::test]
async fn test_missing_argument_is_invalid_params() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    let h = handler(&browser, &dir);

    let resp = send_unwrap(&h, tool_call(6, "search_feeds", json!({}))).await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
    assert!(browser.visited().is_empty());
}

// ═══════════════════════════════════════════════════════
// TOOL RESULTS
// ═══════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_search_tool_returns_feeds() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    let feeds: Vec<Value> = (0..3).map(search_feed).collect();
    browser.route(
        platform::search_url("travel"),
        Fixture::new().with_state(json!({ "search": { "feeds": { "_value": feeds } } })),
    );
    let h = handler(&browser, &dir);

    let resp = send_unwrap(&h, tool_call(7, "search_feeds", json!({ "keyword": "travel" }))).await;
    assert!(resp["result"].get("isError").is_none());
    let body: Value = serde_json::from_str(&first_text(&resp)).unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["feeds"][2]["xsecToken"], "token2");
    assert_eq!(body["feeds"][0]["noteCard"]["user"]["nickname"], "Wanderer");
    assert_eq!(h.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_feed_is_tool_error_with_kind() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.route(
        platform::feed_detail_url("abc123", "tok"),
        Fixture::new().with_state(json!({ "note": { "noteDetailMap": { "xyz999": { "note": { "noteId": "xyz999" } } } } })),
    );
    let h = handler(&browser, &dir);

    let resp = send_unwrap(
        &h,
        tool_call(8, "get_feed_detail", json!({ "feed_id": "abc123", "xsec_token": "tok" })),
    )
    .await;
    assert_eq!(resp["result"]["isError"], true);
    let text = first_text(&resp);
    assert!(text.starts_with("get feed detail failed [not_found]"), "{text}");
    assert!(text.contains("abc123"));
}

#[tokio::test(start_paused = true)]
async fn test_unhydrated_page_reports_state_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.route(platform::BASE_URL, Fixture::new());
    let h = handler(&browser, &dir);

    let resp = send_unwrap(&h, tool_call(9, "list_feeds", json!({}))).await;
    assert_eq!(resp["result"]["isError"], true);
    assert!(first_text(&resp).contains("[state_unavailable]"));
}

#[tokio::test]
async fn test_publish_validation_is_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    let h = handler(&browser, &dir);

    let args = json!({ "title": "字".repeat(21), "content": "c", "images": ["/tmp/a.jpg"] });
    let resp = send_unwrap(&h, tool_call(10, "publish_content", args)).await;
    assert_eq!(resp["result"]["isError"], true);
    assert!(first_text(&resp).contains("[validation_error]"));
    assert!(browser.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unlike_flag_routes_to_unlike() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.route(
        platform::feed_detail_url("xyz999", "tok"),
        Fixture::new()
            .with_state(json!({ "note": { "noteDetailMap": { "xyz999": {
                "note": { "noteId": "xyz999", "interactInfo": { "liked": false } }
            } } } }))
            .with_element(selectors::LIKE_BUTTON, ScriptedElement::new()),
    );
    let h = handler(&browser, &dir);

    let args = json!({ "feed_id": "xyz999", "xsec_token": "tok", "unlike": true });
    let resp = send_unwrap(&h, tool_call(11, "like_feed", args)).await;
    let body: Value = serde_json::from_str(&first_text(&resp)).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "already unliked, nothing to do");
    assert!(browser.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_qrcode_tool_returns_image_content() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.route(
        platform::explore_url(),
        Fixture::new().with_element(
            selectors::LOGIN_QRCODE,
            ScriptedElement::new().attr("src", "data:image/png;base64,QR=="),
        ),
    );
    let h = handler(&browser, &dir);

    let resp = send_unwrap(&h, tool_call(12, "get_login_qrcode", json!({}))).await;
    let content = resp["result"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    assert!(content[0]["text"].as_str().unwrap().contains("5s"));
    assert_eq!(content[1]["type"], "image");
    assert_eq!(content[1]["mimeType"], "image/png");
    assert_eq!(content[1]["data"], "QR==");
}

// ═══════════════════════════════════════════════════════
// CONCURRENCY
// ═══════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_cancellation_notification_stops_call() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.set_never_stable(true);
    let h = Arc::new(handler(&browser, &dir));

    let call = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { send(&h, tool_call(42, "list_feeds", json!({}))).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.in_flight(), 1);

    let cancel = json!({
        "jsonrpc": "2.0",
        "method": "notifications/cancelled",
        "params": { "requestId": 42, "reason": "user aborted" }
    });
    assert!(send(&h, cancel).await.is_none());

    let resp = call.await.unwrap().unwrap();
    assert_eq!(resp["id"], 42);
    assert_eq!(resp["error"]["code"], mcp_error_codes::REQUEST_CANCELLED);
    assert_eq!(h.in_flight(), 0);
    assert_eq!(h.service().active_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_call_releases_page_and_entry() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new();
    browser.set_never_stable(true);
    let h = Arc::new(handler(&browser, &dir));

    let call = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { send(&h, tool_call(7, "search_feeds", json!({ "keyword": "travel" }))).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.in_flight(), 1);
    assert_eq!(h.service().active_pages(), 1);

    // Same as an HTTP client hanging up: the request future is dropped.
    call.abort();
    assert!(call.await.unwrap_err().is_cancelled());
    tokio::task::yield_now().await;

    assert_eq!(h.in_flight(), 0);
    assert_eq!(h.service().active_pages(), 0);
}

#[tokio::test]
async fn test_cancelling_unknown_request_is_harmless() {
    let dir = tempfile::tempdir().unwrap();
    let h = handler(&ScriptedBrowser::new(), &dir);

    let cancel = json!({
        "jsonrpc": "2.0",
        "method": "notifications/cancelled",
        "params": { "requestId": "nope" }
    });
    assert!(send(&h, cancel).await.is_none());
    let resp = send_unwrap(&h, mcp_request(1, "ping", json!({}))).await;
    assert_eq!(resp["result"], json!({}));
}

#[tokio::test]
async fn test_stdio_answers_every_line() {
    let dir = tempfile::tempdir().unwrap();
    let transport = StdioTransport::new(handler(&ScriptedBrowser::new(), &dir));

    let input = [
        mcp_request(1, "ping", json!({})).to_string(),
        "{broken".to_string(),
        String::new(),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        mcp_request(2, "tools/list", json!({})).to_string(),
    ]
    .join("\n");
    let (writer, mut reader) = tokio::io::duplex(1 << 20);

    transport
        .run_with(tokio::io::BufReader::new(input.as_bytes()), writer)
        .await
        .unwrap();

    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    let replies: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 3);

    let mut ids: Vec<String> = replies.iter().map(|r| r["id"].to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2", "null"]);
    let parse_error = replies.iter().find(|r| r["id"].is_null()).unwrap();
    assert_eq!(parse_error["error"]["code"], error_codes::PARSE_ERROR);
}

//! HTTP transport: `POST /mcp` carries one JSON-RPC message, `GET /health`
//! reports liveness. An optional bearer token guards `/mcp`.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::protocol::ProtocolHandler;
use crate::types::{mcp_error_codes, JsonRpcMessage, McpError, McpResult};

use super::framing;

pub struct ServerState {
    pub token: Option<String>,
    pub handler: Arc<ProtocolHandler>,
}

pub struct SseTransport {
    state: Arc<ServerState>,
}

impl SseTransport {
    pub fn new(handler: ProtocolHandler, token: Option<String>) -> Self {
        Self {
            state: Arc::new(ServerState {
                token,
                handler: Arc::new(handler),
            }),
        }
    }

    pub fn router(&self) -> Router {
        let state = Arc::clone(&self.state);
        Router::new()
            .route("/mcp", post(handle_request))
            .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
            .route("/health", get(handle_health))
            .layer(tower_http::cors::CorsLayer::permissive())
            .with_state(state)
    }

    /// Serve on `addr` until `shutdown` resolves.
    pub async fn run<F>(&self, addr: &str, shutdown: F) -> McpResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;
        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))
    }
}

async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                AxumJson(json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": mcp_error_codes::UNAUTHORIZED,
                        "message": McpError::Unauthorized.to_string()
                    }
                })),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn handle_request(
    State(state): State<Arc<ServerState>>,
    AxumJson(body): AxumJson<Value>,
) -> Response {
    let msg: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(msg) => msg,
        Err(e) => {
            let err = McpError::ParseError(e.to_string());
            return (StatusCode::BAD_REQUEST, AxumJson(framing::parse_failure(&err))).into_response();
        }
    };

    match state.handler.handle_message(msg).await {
        Some(response) => AxumJson(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<Value> {
    AxumJson(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "in_flight": state.handler.in_flight(),
        "open_pages": state.handler.service().active_pages(),
    }))
}

//! Request dispatcher. Tool calls run with a per-request cancellation token
//! so `notifications/cancelled` can stop them mid-flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use xhs_pilot::PilotService;

use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

pub struct ProtocolHandler {
    service: Arc<PilotService>,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
    in_flight: InFlight,
}

type InFlight = Arc<StdMutex<HashMap<String, CancellationToken>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
    in_flight.lock().unwrap_or_else(|e| e.into_inner())
}

/// Registration of a running tool call. Dropping it, including when the
/// request future is abandoned, removes the entry.
struct InFlightEntry {
    in_flight: InFlight,
    key: String,
}

impl InFlightEntry {
    fn register(in_flight: &InFlight, key: String, token: CancellationToken) -> Self {
        lock(in_flight).insert(key.clone(), token);
        Self {
            in_flight: Arc::clone(in_flight),
            key,
        }
    }
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
    }
}

impl ProtocolHandler {
    pub fn new(service: Arc<PilotService>) -> Self {
        Self {
            service,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
            in_flight: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub fn service(&self) -> &Arc<PilotService> {
        &self.service
    }

    /// Number of tool calls currently running.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Handle one inbound message. Notifications produce no reply.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Ignoring response-shaped message from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        let id = request.id.clone();
        match self.dispatch_request(&request).await {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default(),
        }
    }

    async fn dispatch_request(&self, request: &JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params.clone()).await,
            "shutdown" => self.handle_shutdown().await,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => {
                self.handle_tools_call(&request.id, request.params.clone())
                    .await
            }
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                self.handle_cancel(notification.params).await;
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_cancel(&self, params: Option<Value>) {
        let params: CancelRequestParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                tracing::warn!("Malformed cancellation: {e}");
                return;
            }
            None => {
                tracing::warn!("Cancellation without params");
                return;
            }
        };
        let Some(id) = RequestId::from_value(&params.request_id) else {
            tracing::warn!("Cancellation with unusable request id {}", params.request_id);
            return;
        };

        let token = lock(&self.in_flight).get(&id.key()).cloned();
        match token {
            Some(token) => {
                tracing::info!(
                    "Cancelling request {id}{}",
                    params
                        .reason
                        .as_deref()
                        .map(|r| format!(": {r}"))
                        .unwrap_or_default()
                );
                token.cancel();
            }
            None => tracing::debug!("Cancellation for unknown or finished request {id}"),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        let result = self.capabilities.lock().await.negotiate(init_params)?;
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        for token in lock(&self.in_flight).values() {
            token.cancel();
        }
        self.service.shutdown().await?;
        Ok(Value::Object(serde_json::Map::new()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: ToolRegistry::list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, id: &RequestId, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let token = CancellationToken::new();
        let entry = InFlightEntry::register(&self.in_flight, id.key(), token.clone());

        let ctx = self.service.context().with_token(token);
        let result = ToolRegistry::call(
            &call_params.name,
            call_params.arguments,
            &self.service,
            &ctx,
        )
        .await;

        drop(entry);

        let result = result?;
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

//! MCP request handling shared by the stdio and HTTP transports

use super::protocol::*;
use super::tools::{tool_definitions, ToolDispatcher};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

/// Answers JSON-RPC messages; cheap to clone into per-request tasks
#[derive(Clone)]
pub struct McpHandler {
    dispatcher: ToolDispatcher,
}

impl McpHandler {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("invalid request: {}", e),
            )),
        }
    }

    /// Handle one decoded request
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!("Notification {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(&request.params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err((METHOD_NOT_FOUND, format!("method not found: {}", other))),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    fn initialize(&self, params: &Value) -> Value {
        if let Some(client) = params.get("clientInfo").and_then(|c| c.get("name")) {
            info!("Client connected: {}", client);
        }
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": crate::SERVER_NAME,
                "version": crate::VERSION,
            }
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| (INVALID_PARAMS, format!("invalid tools/call params: {}", e)))?;
        let arguments = params.arguments.unwrap_or_else(Map::new);

        debug!("Calling tool {}", params.name);
        let result = match self.dispatcher.call(&params.name, &arguments).await {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                warn!("Tool {} failed: {}", params.name, e);
                CallToolResult::error(e.to_string())
            }
        };

        serde_json::to_value(result).map_err(|e| (INVALID_PARAMS, e.to_string()))
    }
}

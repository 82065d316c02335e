//! MCP server exposing `query_weather` over newline-delimited JSON-RPC

use anyhow::Result;
use relay_core::protocol::{
    methods, CallToolParams, CallToolResult, Implementation, Incoming, IncomingMessage,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    ServerCapabilities, ToolDescriptor, MCP_PROTOCOL_VERSION,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::client::WeatherSource;
use crate::format::format_weather_data;

/// Name the tool is published under
pub const TOOL_NAME: &str = "query_weather";

const TOOL_DESCRIPTION: &str = "输入指定城市的中文名称，返回今日的天气情况。";

/// Name reported in the initialize handshake
pub const SERVER_NAME: &str = "WeatherServer";

pub struct WeatherServer<S> {
    source: S,
}

impl<S: WeatherSource> WeatherServer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The single tool this server offers
    pub fn tool() -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: Some(TOOL_DESCRIPTION.to_string()),
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "城市名称"
                    }
                },
                "required": ["city"]
            })),
        }
    }

    /// Serve requests from `input` until it closes, one JSON message per line
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let message = match serde_json::from_str::<IncomingMessage>(text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "ignoring unparseable message");
                    continue;
                }
            };

            if let Some(response) = self.handle(message).await {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                output.write_all(encoded.as_bytes()).await?;
                output.flush().await?;
            }
        }

        info!("input closed, shutting down");
        Ok(())
    }

    /// Answer one message. Notifications and stray responses get no reply.
    pub async fn handle(&self, message: IncomingMessage) -> Option<JsonRpcResponse> {
        match message.classify()? {
            Incoming::Request(request) => Some(self.handle_request(request).await),
            Incoming::Notification(note) => {
                debug!(method = %note.method, "notification");
                None
            }
            Incoming::Response(response) => {
                debug!(id = %response.id, "ignoring response from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        match self.dispatch(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                debug!(id = %id, error = %error, "request rejected");
                JsonRpcResponse::failure(id, error)
            }
        }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        match request.method.as_str() {
            methods::INITIALIZE => to_result(&InitializeResult {
                protocol_version: MCP_PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(json!({})),
                },
                server_info: Implementation {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            }),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => to_result(&ListToolsResult {
                tools: vec![Self::tool()],
            }),
            methods::TOOLS_CALL => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        if params.name != TOOL_NAME {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                params.name
            )));
        }

        let city = params
            .arguments
            .get("city")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing required argument: city"))?;

        info!(city, "query_weather");
        let data = self.source.fetch(city).await;
        to_result(&CallToolResult::text(format_weather_data(&data)))
    }
}

fn to_result<T: Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}

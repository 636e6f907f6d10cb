//! JSON-RPC tool protocol (MCP style).
//!
//! Exposes the renderer as two tools, `generate_grid_availability_image` and
//! `generate_grid_availability_image_vertical`. [`McpService`] is transport
//! agnostic: it maps one JSON-RPC message to at most one reply. The stdio
//! transport ([`serve_lines`]) reads newline-delimited messages; the HTTP
//! transport lives in [`crate::server`].

use crate::{
    error::{RenderError, RequestError},
    renderer::GridRenderer,
    request::{input_schema, GenerateImageRequest, MIME_PNG, SUCCESS_MESSAGE},
    text::{SystemPainter, TextPainter},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{io, path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "Grid Image Generator";

pub const TOOL_HORIZONTAL: &str = "generate_grid_availability_image";
pub const TOOL_VERTICAL: &str = "generate_grid_availability_image_vertical";

// ============================================================================
// Wire Types
// ============================================================================

/// Standard JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
}

/// Incoming message. Without an `id` it is a notification and gets no reply.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Outcome of a successful tool call.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub path: PathBuf,
    pub image_size: String,
    pub png: Vec<u8>,
    pub include_image: bool,
}

impl ToolOutput {
    /// MCP `CallToolResult` payload.
    pub fn to_result(&self) -> Value {
        let mut content = vec![json!({
            "type": "text",
            "text": format!(
                "{SUCCESS_MESSAGE} at: {}. Image size: {} ({} bytes)",
                self.path.display(),
                self.image_size,
                self.png.len()
            )
        })];
        if self.include_image {
            content.push(json!({
                "type": "image",
                "data": STANDARD.encode(&self.png),
                "mimeType": MIME_PNG
            }));
        }
        json!({ "content": content, "isError": false })
    }
}

fn tool_error_result(err: &RequestError) -> Value {
    json!({
        "content": [{ "type": "text", "text": err.to_string() }],
        "isError": true
    })
}

/// Tool catalogue returned by `tools/list`.
pub fn tool_definitions() -> Value {
    let about = "Input data should be a JSON object with T_Date (format: DD-MM-YYYY) and \
                 T_00 through T_23 keys with values: '●' (available), '✕' (unavailable), \
                 '%' (partial/transition), or '-' (unknown).";
    json!([
        {
            "name": TOOL_HORIZONTAL,
            "description": format!(
                "Generate an image showing electricity grid availability for a given date. \
                 The image can be horizontal (1024x250px) or vertical (250x1024px). {about}"
            ),
            "inputSchema": input_schema(true, true)
        },
        {
            "name": TOOL_VERTICAL,
            "description": format!(
                "Generate a vertical-oriented image (250x1024px) showing electricity grid \
                 availability for a given date. {about}"
            ),
            "inputSchema": input_schema(false, true)
        }
    ])
}

// ============================================================================
// Service
// ============================================================================

/// Maps JSON-RPC messages to replies.
pub struct McpService<P = &'static SystemPainter> {
    renderer: Arc<GridRenderer<P>>,
}

impl<P: TextPainter> McpService<P> {
    pub fn new(renderer: Arc<GridRenderer<P>>) -> Self {
        Self { renderer }
    }

    /// Handle one raw message. Unparseable input yields a parse error reply.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value),
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(codes::PARSE_ERROR, format!("Parse error: {e}")),
                ))
            }
        }
    }

    pub fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        if value.is_array() {
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::new(codes::INVALID_REQUEST, "Batch requests are not supported"),
            ));
        }
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request),
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(codes::INVALID_REQUEST, format!("Invalid request: {e}")),
            )),
        }
    }

    /// Dispatch a parsed request. Notifications return `None`.
    pub fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };
        debug!(method = %request.method, %id, "Request received");

        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    codes::INVALID_REQUEST,
                    format!("Invalid request: jsonrpc must be \"{JSONRPC_VERSION}\""),
                ),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(request.params),
            other => Err(JsonRpcError::new(
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::new(codes::INVALID_PARAMS, format!("Invalid params: {e}")))?;
        let force_vertical = match params.name.as_str() {
            TOOL_HORIZONTAL => false,
            TOOL_VERTICAL => true,
            other => {
                return Err(JsonRpcError::new(
                    codes::METHOD_NOT_FOUND,
                    format!("Unknown tool: {other}"),
                ))
            }
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let mut request = GenerateImageRequest::from_value(arguments)
            .map_err(|e| JsonRpcError::new(codes::INVALID_PARAMS, e.to_string()))?;
        request.vertical |= force_vertical;

        match self.generate(&request) {
            Ok(output) => {
                info!(
                    tool = %params.name,
                    path = %output.path.display(),
                    bytes = output.png.len(),
                    "Tool call succeeded"
                );
                Ok(output.to_result())
            }
            Err(err) => {
                if err.is_client_error() {
                    warn!(tool = %params.name, error = %err, "Tool call rejected");
                } else {
                    error!(tool = %params.name, error = %err, "Tool call failed");
                }
                Ok(tool_error_result(&err))
            }
        }
    }

    /// Render a request to its output file. Without `output_path` the image
    /// goes to a temporary file that is kept after the call.
    pub fn generate(&self, request: &GenerateImageRequest) -> Result<ToolOutput, RequestError> {
        let record = request.record()?;
        let orientation = request.orientation();
        let path = match &request.output_path {
            Some(path) => path.clone(),
            None => kept_temp_path().map_err(RenderError::from)?,
        };
        let png = self.renderer.render_to_file(&record, orientation, &path)?;
        Ok(ToolOutput {
            path,
            image_size: orientation.size_label(),
            png,
            include_image: request.return_base64,
        })
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn kept_temp_path() -> io::Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("grid_availability_")
        .suffix(".png")
        .tempfile()?;
    let (_, path) = file.keep().map_err(io::Error::from)?;
    Ok(path)
}

// ============================================================================
// Stdio Transport
// ============================================================================

/// Serve newline-delimited JSON-RPC until `reader` reaches end of input.
/// Each message is handled on the blocking pool; replies are written one
/// per line and flushed immediately.
pub async fn serve_lines<P, R, W>(
    service: Arc<McpService<P>>,
    reader: R,
    mut writer: W,
) -> io::Result<()>
where
    P: TextPainter + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let handler = Arc::clone(&service);
        let reply = tokio::task::spawn_blocking(move || handler.handle_line(&line))
            .await
            .map_err(io::Error::other)?;
        if let Some(reply) = reply {
            let mut bytes = serde_json::to_vec(&reply)?;
            bytes.push(b'\n');
            writer.write_all(&bytes).await?;
            writer.flush().await?;
        }
    }
    info!("Input closed, stopping tool server");
    Ok(())
}

/// Serve on stdin/stdout.
pub async fn serve_stdio<P: TextPainter + 'static>(service: Arc<McpService<P>>) -> io::Result<()> {
    info!("Tool server listening on stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(service, stdin, tokio::io::stdout()).await
}

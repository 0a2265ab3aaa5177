//! MCP server implementation.
//!
//! JSON-RPC 2.0 framing and method dispatch. Every transport funnels one
//! raw request through [`McpServer::handle_request`] and writes back
//! whatever it returns.

use super::dispatch::McpMethod;
use super::tools::ToolRegistry;
use crate::config::{DEFAULT_PORT, Transport};
use crate::services::MemoryService;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "simple-memory-mcp-server";

/// Maximum request size in bytes (1 MiB plus envelope headroom).
pub const MAX_REQUEST_BODY_SIZE: usize = 1_048_576 + 64 * 1024;

/// JSON-RPC error: the request was not valid JSON.
pub const PARSE_ERROR: i32 = -32700;
/// JSON-RPC error: the request object was malformed or too large.
pub const INVALID_REQUEST: i32 = -32600;
/// JSON-RPC error: unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error: required params missing.
pub const INVALID_PARAMS: i32 = -32602;

/// MCP server for the simple-memory tools.
pub struct McpServer {
    tools: ToolRegistry,
    transport: Transport,
    port: u16,
}

impl McpServer {
    /// Creates a stdio server backed by `service`.
    #[must_use]
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self {
            tools: ToolRegistry::new(service),
            transport: Transport::default(),
            port: DEFAULT_PORT,
        }
    }

    /// Sets the transport.
    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the configured transport.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns the tool registry.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Starts the server and blocks until the transport closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, or
    /// [`Error::FeatureNotEnabled`] for HTTP/SSE without the `http` feature.
    pub fn start(self) -> Result<()> {
        tracing::info!(transport = %self.transport, "Starting MCP server");
        match self.transport {
            Transport::Stdio => self.run_stdio(),
            Transport::Http | Transport::Sse => self.run_http(),
        }
    }

    /// Serves newline-delimited JSON-RPC on stdin/stdout until EOF.
    fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve_lines(BufReader::new(stdin.lock()), stdout.lock())
    }

    /// Serves newline-delimited JSON-RPC from `reader` to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if reading or writing fails.
    pub fn serve_lines<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        for line in reader.lines() {
            let line = line.map_err(|e| Error::OperationFailed {
                operation: "read_stdin".to_string(),
                cause: e.to_string(),
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_request(&line) else {
                continue;
            };

            writeln!(writer, "{response}").map_err(|e| Error::OperationFailed {
                operation: "write_stdout".to_string(),
                cause: e.to_string(),
            })?;
            writer.flush().map_err(|e| Error::OperationFailed {
                operation: "flush_stdout".to_string(),
                cause: e.to_string(),
            })?;
        }

        tracing::info!("Input closed; stopping MCP server");
        Ok(())
    }

    #[cfg(feature = "http")]
    fn run_http(self) -> Result<()> {
        let port = self.port;
        super::http::serve(Arc::new(self), port)
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::needless_pass_by_value)]
    fn run_http(self) -> Result<()> {
        Err(Error::FeatureNotEnabled("http".to_string()))
    }

    /// Handles one JSON-RPC message.
    ///
    /// Returns `None` for notifications, which get no reply.
    pub fn handle_request(&self, request: &str) -> Option<String> {
        let transport_label = self.transport.as_str();

        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return Some(format_error(
                None,
                INVALID_REQUEST,
                &format!(
                    "Request too large: {} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)",
                    request.len()
                ),
            ));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            transport = transport_label,
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let (method_label, status_label, response) =
            match serde_json::from_str::<JsonRpcRequest>(request) {
                Ok(req) => {
                    let method = McpMethod::from(req.method.as_str());
                    span.record("rpc.method", method.as_str());
                    if let Some(id) = &req.id {
                        span.record("rpc.id", id.to_string().as_str());
                    }

                    if method.is_notification() {
                        tracing::debug!(method = %method, "Ignoring notification");
                        (method.metric_label(), "success", None)
                    } else {
                        tracing::debug!(method = %method, "Processing MCP request");
                        let result = self.dispatch_method(&method, req.params);
                        let status = if result.is_ok() { "success" } else { "error" };
                        (method.metric_label(), status, Some(format_response(req.id, result)))
                    }
                },
                Err(e) => (
                    "parse_error",
                    "error",
                    Some(format_error(None, PARSE_ERROR, &format!("Parse error: {e}"))),
                ),
            };
        span.record("status", status_label);

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label,
            "transport" => transport_label,
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_request_duration_ms",
            "method" => method_label,
            "transport" => transport_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    fn dispatch_method(&self, method: &McpMethod, params: Option<Value>) -> DispatchResult {
        match method {
            McpMethod::Initialize => Ok(handle_initialize()),
            McpMethod::ListTools => self.handle_list_tools(),
            McpMethod::CallTool => self.handle_call_tool(params),
            McpMethod::ListResources => Ok(serde_json::json!({ "resources": [] })),
            McpMethod::ListPrompts => Ok(serde_json::json!({ "prompts": [] })),
            McpMethod::Ping | McpMethod::Notification(_) => Ok(serde_json::json!({})),
            McpMethod::Unknown(name) => {
                Err((METHOD_NOT_FOUND, format!("Method not found: {name}")))
            },
        }
    }

    fn handle_list_tools(&self) -> DispatchResult {
        let tools = serde_json::to_value(self.tools.list_tools())
            .map_err(|e| (INVALID_REQUEST, e.to_string()))?;
        Ok(serde_json::json!({ "tools": tools }))
    }

    /// Runs a tool. Tool failures are results with `isError: true`, not
    /// JSON-RPC errors.
    fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or_else(|| (INVALID_PARAMS, "Missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| (INVALID_PARAMS, "Missing tool name".to_string()))?;
        let tool_label = self
            .tools
            .get_tool(name)
            .map_or_else(|| "unknown".to_string(), |tool| tool.name.clone());

        let span = info_span!("mcp.tool.call", tool.name = name);
        let _guard = span.enter();
        let start = Instant::now();

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let result = match self.tools.execute(name, arguments) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                super::tools::ToolResult::error(e.to_string())
            },
        };
        let status_label = if result.is_error { "error" } else { "success" };

        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => tool_label.clone(),
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_tool_duration_ms",
            "tool" => tool_label,
            "status" => status_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        serde_json::to_value(result).map_err(|e| (INVALID_REQUEST, e.to_string()))
    }
}

fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

/// Formats a JSON-RPC error response.
pub fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0",
        id: Some(id.unwrap_or(Value::Null)),
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// Protocol version tag; required but not otherwise used.
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

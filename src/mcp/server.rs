//! MCP server setup and lifecycle.
//!
//! Implements a JSON-RPC 2.0 MCP server over stdio: one request per line in,
//! one response per line out. Notifications (requests without an `id`) get
//! no response.

use super::dispatch::McpMethod;
use crate::mcp::ToolRegistry;
use crate::services::CleanupService;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{Instrument, info_span};

/// Default maximum requests per rate limit window.
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 1000;

/// Default rate limit window duration (1 minute).
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Maximum request size in bytes.
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name.
const SERVER_NAME: &str = "cloudreap";

/// MCP rate limit configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: usize,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    /// Creates config from environment variables.
    ///
    /// Reads `CLOUDREAP_MCP_RATE_LIMIT_MAX_REQUESTS` and
    /// `CLOUDREAP_MCP_RATE_LIMIT_WINDOW_SECS` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let max_requests = std::env::var("CLOUDREAP_MCP_RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);

        let window_secs = std::env::var("CLOUDREAP_MCP_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);

        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Sets maximum requests per window.
    #[must_use]
    pub const fn with_max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Sets window duration in seconds.
    #[must_use]
    pub const fn with_window_secs(mut self, secs: u64) -> Self {
        self.window = Duration::from_secs(secs);
        self
    }
}

/// MCP server for cloudreap.
#[derive(Debug)]
pub struct McpServer {
    /// Tool registry.
    tools: ToolRegistry,
    /// Rate limit configuration.
    rate_limit: RateLimitConfig,
}

impl McpServer {
    /// Creates a new MCP server over the given service.
    #[must_use]
    pub fn new(service: Arc<CleanupService>) -> Self {
        Self {
            tools: ToolRegistry::new(service),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Sets the rate limit configuration.
    #[must_use]
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Serves requests on the process's stdin and stdout until EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read or stdout cannot be written.
    pub async fn serve_stdio(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run(reader, writer).await
    }

    /// Serves line-delimited requests from `reader`, writing responses to
    /// `writer`, until EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = reader;
        let mut buf = Vec::new();

        let mut request_count: usize = 0;
        let mut window_start = Instant::now();

        tracing::info!(server = SERVER_NAME, "MCP server listening on stdio");

        loop {
            let line = match read_bounded_line(&mut reader, &mut buf, MAX_REQUEST_BODY_SIZE).await? {
                LineRead::Eof => break,
                LineRead::TooLarge(size) => {
                    tracing::warn!(
                        request_size = size,
                        max_size = MAX_REQUEST_BODY_SIZE,
                        "Request exceeds maximum size limit"
                    );
                    let response = format_error(
                        None,
                        -32600,
                        &format!("Request too large: {size} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)"),
                    );
                    write_line(&mut writer, &response).await?;
                    continue;
                },
                LineRead::Line(line) => line,
            };

            if line.trim().is_empty() {
                continue;
            }

            if window_start.elapsed() > self.rate_limit.window {
                request_count = 0;
                window_start = Instant::now();
            }

            let response = if request_count >= self.rate_limit.max_requests {
                let max_requests = self.rate_limit.max_requests;
                let window = self.rate_limit.window;
                tracing::warn!("Rate limit exceeded: {request_count} requests in {window:?}");
                metrics::counter!("mcp_rate_limit_exceeded_total").increment(1);
                rate_limited(
                    &line,
                    &format!("Rate limit exceeded: max {max_requests} requests per {window:?}"),
                )
            } else {
                request_count += 1;
                self.handle_request(&line).await
            };

            if let Some(response) = response {
                write_line(&mut writer, &response).await?;
            }
        }

        tracing::info!("MCP client disconnected");
        Ok(())
    }

    /// Handles a JSON-RPC request, returning `None` for notifications.
    pub async fn handle_request(&self, request: &str) -> Option<String> {
        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return Some(format_error(
                None,
                -32600,
                &format!(
                    "Request too large: {} bytes (max: {} bytes)",
                    request.len(),
                    MAX_REQUEST_BODY_SIZE
                ),
            ));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(request);
        let mut method_label = "parse_error".to_string();
        let mut status_label = "error";

        let response = match parsed {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());
                if let Some(id) = &req.id {
                    span.record("rpc.id", id.to_string().as_str());
                }

                let result = self
                    .dispatch_method(&req.method, req.params)
                    .instrument(span.clone())
                    .await;
                status_label = if result.is_ok() { "success" } else { "error" };
                span.record("status", status_label);

                req.id.map(|id| format_response(Some(id), result))
            },
            Err(e) => {
                span.record("status", "parse_error");
                Some(format_error(None, -32700, &format!("Parse error: {e}")))
            },
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label.clone(),
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!("mcp_request_duration_ms", "method" => method_label)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    async fn dispatch_method(&self, method: &str, params: Option<Value>) -> DispatchResult {
        match McpMethod::from(method) {
            McpMethod::Initialize => Ok(handle_initialize()),
            McpMethod::Initialized | McpMethod::Ping => Ok(serde_json::json!({})),
            McpMethod::ListTools => Ok(self.handle_list_tools()),
            McpMethod::CallTool => self.handle_call_tool(params).await,
            McpMethod::Unknown(name) => Err((-32601, format!("Method not found: {name}"))),
        }
    }

    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        serde_json::json!({ "tools": tools })
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or_else(|| (-32602, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| (-32602, "Missing tool name".to_string()))?
            .to_string();
        let start = Instant::now();

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));

        let (result, status_label) = match self
            .tools
            .execute(&name, arguments)
            .instrument(info_span!("mcp.tool.call", tool.name = name.as_str()))
            .await
        {
            Ok(result) => {
                let status_label = if result.is_error { "error" } else { "success" };
                (
                    serde_json::json!({
                        "content": result.content,
                        "isError": result.is_error
                    }),
                    status_label,
                )
            },
            Err(e) => (
                serde_json::json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true
                }),
                "error",
            ),
        };

        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => name.clone(),
            "status" => status_label
        )
        .increment(1);
        if status_label == "error" {
            metrics::counter!("mcp_tool_errors_total", "tool" => name.clone()).increment(1);
        }
        metrics::histogram!(
            "mcp_tool_duration_ms",
            "tool" => name,
            "status" => status_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        Ok(result)
    }
}

fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    let write_err = |e: std::io::Error| Error::OperationFailed {
        operation: "write_stdout".to_string(),
        cause: e.to_string(),
    };
    writer.write_all(line.as_bytes()).await.map_err(write_err)?;
    writer.write_all(b"\n").await.map_err(write_err)?;
    writer.flush().await.map_err(|e| Error::OperationFailed {
        operation: "flush_stdout".to_string(),
        cause: e.to_string(),
    })
}

/// Formats a response from a dispatch result.
fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

/// Outcome of reading one request line.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    /// A complete line without its terminator.
    Line(String),
    /// A line longer than the limit; the bytes read so far, the rest discarded.
    TooLarge(usize),
    /// End of input.
    Eof,
}

/// Chunk size used when discarding the tail of an oversized line.
const DISCARD_CHUNK: u64 = 64 * 1024;

/// Reads one newline-terminated line, buffering at most `limit + 1` bytes.
async fn read_bounded_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> Result<LineRead> {
    let read_err = |e: std::io::Error| Error::OperationFailed {
        operation: "read_stdin".to_string(),
        cause: e.to_string(),
    };
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);

    buf.clear();
    let read = (&mut *reader)
        .take(cap)
        .read_until(b'\n', buf)
        .await
        .map_err(read_err)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }

    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    if buf.len() > limit {
        let mut discarded = buf.len();
        if !terminated {
            let mut scratch = Vec::new();
            loop {
                scratch.clear();
                let n = (&mut *reader)
                    .take(DISCARD_CHUNK)
                    .read_until(b'\n', &mut scratch)
                    .await
                    .map_err(read_err)?;
                discarded += n;
                if n == 0 || scratch.last() == Some(&b'\n') {
                    break;
                }
            }
        }
        return Ok(LineRead::TooLarge(discarded));
    }

    Ok(LineRead::Line(String::from_utf8_lossy(buf).into_owned()))
}

/// Builds the rate-limit error for `line`, echoing its `id`.
///
/// Notifications get no response. Unparsable lines are answered with a
/// `null` id.
fn rate_limited(line: &str, message: &str) -> Option<String> {
    let id = match serde_json::from_str::<Value>(line) {
        Ok(request) => Some(request.get("id").filter(|id| !id.is_null())?.clone()),
        Err(_) => None,
    };
    Some(format_error(id, -32000, message))
}

/// Formats an error response.
fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (required by protocol but not used in code).
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

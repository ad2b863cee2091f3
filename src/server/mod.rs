// src/server/mod.rs

//! Line-framed JSON-RPC 2.0 server exposing manager operations as MCP
//! tools.
//!
//! Each input line is one JSON-RPC message; each response is one JSON value
//! followed by a linefeed. Requests without an `id` are notifications: they
//! are processed but never answered. Tool-level failures travel inside a
//! successful `result` with `isError: true`; only envelope problems (parse
//! errors, unknown methods, unknown tools, malformed params) become
//! JSON-RPC error responses.
//!
//! - [`tools`] declares the tool descriptors served by `tools/list`.
//! - [`handlers`] maps `tools/call` invocations onto the manager.

pub mod handlers;
pub mod tools;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::errors::{Result, TrellisError};
use crate::manager::Manager;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "trellis-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// An incoming JSON-RPC request or notification.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl Response {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: &'static str,
    server_info: ServerInfo,
    capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct Capabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
struct ToolsCapability {}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

#[derive(Debug, Serialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl ToolCallResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ContentBlock { kind: "text", text }],
            is_error,
        }
    }
}

/// The MCP server wrapping a [`Manager`].
#[derive(Debug)]
pub struct Server {
    manager: Manager,
}

impl Server {
    pub fn new(manager: Manager) -> Self {
        Self { manager }
    }

    /// Read JSON-RPC messages line by line from `reader` and write responses
    /// to `writer`. Blocks until the reader is exhausted or a write fails.
    ///
    /// Unparseable lines are answered with a `-32700` response carrying a
    /// null id, and processing continues with the next line.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        info!("RPC server listening on line-framed stdio");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(line) {
                Ok(req) => self.handle(req),
                Err(err) => {
                    warn!(error = %err, "failed to parse request line");
                    Some(Response::error(Value::Null, PARSE_ERROR, "parse error"))
                }
            };

            if let Some(resp) = response {
                let data = serde_json::to_string(&resp)?;
                writer.write_all(data.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("input stream closed; server loop ending");
        Ok(())
    }

    /// Dispatch one message. Returns `None` for notifications.
    fn handle(&self, req: Request) -> Option<Response> {
        let is_notification = req.id.is_none();
        let id = req.id.unwrap_or(Value::Null);

        let response = match req.method.as_str() {
            "initialize" => initialize_response(id),
            "notifications/initialized" => {
                info!("client initialized");
                return None;
            }
            "tools/list" => list_tools_response(id),
            "tools/call" => self.call_tool_response(id, req.params),
            other => Response::error(
                id,
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        };

        if is_notification {
            None
        } else {
            Some(response)
        }
    }

    fn call_tool_response(&self, id: Value, params: Option<Value>) -> Response {
        let params: ToolCallParams =
            match serde_json::from_value(params.unwrap_or(Value::Null)) {
                Ok(p) => p,
                Err(err) => {
                    return Response::error(id, INVALID_PARAMS, format!("invalid params: {err}"))
                }
            };

        match handlers::dispatch(&self.manager, &params.name, params.arguments) {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(text) => Response::result(id, tool_result(ToolCallResult::text(text, false))),
                Err(err) => {
                    Response::result(id, tool_result(ToolCallResult::text(err.to_string(), true)))
                }
            },
            Err(TrellisError::UnknownTool(name)) => {
                Response::error(id, INVALID_PARAMS, format!("unknown tool: {name}"))
            }
            Err(err) => {
                warn!(tool = %params.name, error = %err, "tool call failed");
                Response::result(id, tool_result(ToolCallResult::text(err.to_string(), true)))
            }
        }
    }
}

fn initialize_response(id: Value) -> Response {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION,
        server_info: ServerInfo {
            name: SERVER_NAME,
            version: SERVER_VERSION,
        },
        capabilities: Capabilities {
            tools: ToolsCapability {},
        },
    };
    Response::result(id, to_value_or_null(&result))
}

fn list_tools_response(id: Value) -> Response {
    Response::result(
        id,
        serde_json::json!({ "tools": tools::registry() }),
    )
}

fn tool_result(result: ToolCallResult) -> Value {
    to_value_or_null(&result)
}

fn to_value_or_null<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

//! Line-delimited JSON-RPC server loop.
//!
//! One request line is read, fully handled (including any outbound API call),
//! and answered before the next line is read, so responses come out in
//! request order. Logs go through the injected [`Logger`], never to the
//! response stream.

use super::error::ProtocolError;
use super::executor::{ToolExecutor, panic_message};
use super::jsonrpc::{JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, RequestId, methods};
use super::registry::ToolRegistry;
use super::types::{
    CallToolParams, InitializeResult, ListToolsResult, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolsCapability,
};
use crate::api::ApiClient;
use crate::telemetry::Logger;
use futures::FutureExt;
use serde_json::{Value, json};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The input stream reached EOF.
    EndOfInput,
    /// The shutdown future resolved (interrupt / terminate).
    Shutdown,
}

/// Counters reported when the loop closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    pub reason: CloseReason,
    pub lines_read: u64,
    pub responses_written: u64,
}

#[derive(Debug, Clone)]
pub struct McpServer {
    info: ServerInfo,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    logger: Arc<dyn Logger>,
}

impl McpServer {
    pub fn new(
        info: ServerInfo,
        registry: Arc<ToolRegistry>,
        api: Option<Arc<ApiClient>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            info,
            registry,
            executor: ToolExecutor::new(api, Arc::clone(&logger)),
            logger,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve until `reader` hits EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<ServeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.serve_until(reader, writer, std::future::pending::<()>())
            .await
    }

    /// Serve until `reader` hits EOF or `shutdown` resolves.
    ///
    /// Once `shutdown` resolves nothing more is written, even if a request was
    /// mid-flight; that request is dropped.
    pub async fn serve_until<R, W, F>(
        &self,
        reader: R,
        mut writer: W,
        shutdown: F,
    ) -> std::io::Result<ServeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut segments = reader.split(b'\n');
        let mut lines_read = 0u64;
        let mut responses_written = 0u64;
        tokio::pin!(shutdown);

        self.logger.info(
            "server ready",
            &json!({
                "name": self.info.name,
                "version": self.info.version,
                "tools": self.registry.names(),
                "api_configured": self.executor.has_api(),
            }),
        );

        let reason = loop {
            let segment = tokio::select! {
                biased;
                () = &mut shutdown => break CloseReason::Shutdown,
                segment = segments.next_segment() => segment?,
            };
            let Some(bytes) = segment else {
                break CloseReason::EndOfInput;
            };
            lines_read += 1;

            let response = tokio::select! {
                biased;
                () = &mut shutdown => break CloseReason::Shutdown,
                response = self.handle_bytes(&bytes) => response,
            };

            if let Some(response) = response {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
                responses_written += 1;
            }
        };

        let summary = ServeSummary {
            reason,
            lines_read,
            responses_written,
        };
        self.logger.info(
            "server closing",
            &json!({
                "reason": format!("{reason:?}"),
                "lines_read": lines_read,
                "responses_written": responses_written,
            }),
        );
        Ok(summary)
    }

    async fn handle_bytes(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        match std::str::from_utf8(bytes) {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => self.handle_line(line).await,
            Err(e) => {
                self.logger
                    .warn("input line is not valid UTF-8", &json!({ "error": e.to_string() }));
                Some(ProtocolError::Parse(format!("input is not valid UTF-8: {e}")).into_response(None))
            }
        }
    }

    /// Handle one input line. `None` means nothing should be written
    /// (blank line or notification).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                self.logger.warn(
                    "unparsable input line",
                    &json!({ "error": e.to_string(), "line_preview": crate::telemetry::preview(line) }),
                );
                return Some(ProtocolError::Parse(e.to_string()).into_response(None));
            }
        };

        let id = RequestId::recover(&value);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                self.logger
                    .warn("invalid JSON-RPC envelope", &json!({ "error": e.to_string() }));
                return Some(ProtocolError::InvalidRequest(e.to_string()).into_response(id));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            let err = ProtocolError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return request.id.map(|id| err.into_response(Some(id)));
        }

        let Some(id) = request.id.clone() else {
            self.logger
                .debug("notification received", &json!({ "method": request.method }));
            return None;
        };

        self.logger.debug(
            "request received",
            &json!({ "id": id.to_string(), "method": request.method }),
        );

        let outcome = AssertUnwindSafe(self.dispatch(&request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ProtocolError::Internal(panic_message(panic.as_ref()))));

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(err) => {
                self.logger.error(
                    "request failed",
                    &json!({
                        "id": id.to_string(),
                        "method": request.method,
                        "code": err.code(),
                        "error": err.to_string(),
                    }),
                );
                err.into_response(Some(id))
            }
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, ProtocolError> {
        match request.method.as_str() {
            methods::INITIALIZE => to_result(&self.initialize(&request.params)),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => to_result(&ListToolsResult {
                tools: self.registry.descriptors(),
            }),
            methods::TOOLS_CALL => self.call_tool(&request.params).await,
            other => Err(ProtocolError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: &Value) -> InitializeResult {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION)
            .to_string();
        InitializeResult {
            protocol_version,
            server_info: self.info.clone(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
        }
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, ProtocolError> {
        let params: CallToolParams = serde_json::from_value(params.clone())
            .map_err(|e| ProtocolError::InvalidParams(format!("tools/call expects {{name, arguments}}: {e}")))?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| ProtocolError::ToolNotFound {
                name: params.name.clone(),
                available: self.registry.names(),
            })?;

        let result = self
            .executor
            .execute(tool.as_ref(), params.arguments)
            .await
            .map_err(|e| ProtocolError::Internal(format!("tool '{}' failed: {e}", params.name)))?;

        to_result(&result)
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(value).map_err(|e| ProtocolError::Internal(e.to_string()))
}

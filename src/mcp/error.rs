//! Error types for the protocol layer and tool execution.

use super::jsonrpc::{JsonRpcResponse, RequestId, error_codes};
use super::validation::Violation;
use crate::api::ApiError;
use thiserror::Error;

/// Failures surfaced to the client as JSON-RPC error objects.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: '{name}'. Available tools: {}", available.join(", "))]
    ToolNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => error_codes::PARSE_ERROR,
            Self::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            Self::MethodNotFound(_) | Self::ToolNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => error_codes::INVALID_PARAMS,
            Self::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn into_response(self, id: Option<RequestId>) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.code(), self.to_string())
    }
}

/// Failures raised by a tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not fit the tool. Rendered as text, never a protocol error.
    #[error("invalid arguments ({} problem(s))", .0.len())]
    InvalidArguments(Vec<Violation>),

    /// A classified API failure the tool has no fallback for.
    #[error("lookup API call failed: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Execution(String),
}

/// Failures while building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    DuplicateTool(String),
}

//! Model Context Protocol (MCP) server over line-delimited JSON-RPC.
//!
//! Requests arrive one per line on an input stream; each one gets at most
//! one response line on the output stream:
//!
//! ```json
//! {"jsonrpc":"2.0","method":"tools/call","params":{"name":"search_articles","arguments":{"query":"rate limit"}},"id":2}
//! {"jsonrpc":"2.0","result":{"content":[{"type":"text","text":"..."}]},"id":2}
//! ```
//!
//! # Methods
//!
//! - `initialize`: server identity and capabilities
//! - `ping`: liveness check
//! - `tools/list`: registered tools in registration order
//! - `tools/call`: validate arguments, run the handler, wrap the text
//!
//! Notifications (no `id`) are accepted and never answered.

pub mod error;
pub mod executor;
pub mod jsonrpc;
pub mod registry;
pub mod server;
pub mod types;
pub mod validation;

pub use error::{ProtocolError, RegistryError, ToolError};
pub use executor::ToolExecutor;
pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse, RequestId};
pub use registry::{Tool, ToolRegistry};
pub use server::{CloseReason, McpServer, ServeSummary};
pub use types::{CallToolResult, ContentBlock, McpTool, ServerInfo};
pub use validation::Violation;

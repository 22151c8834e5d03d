//! MCP (Model Context Protocol) implementation
//!
//! Tool registry, dispatch and the JSON-RPC runtime shared by the SSE and
//! direct-call transports.

pub mod dispatch;
pub mod handler;
pub mod protocol;
pub mod tools;

pub use dispatch::{parse_arguments, ToolDispatcher};
pub use handler::SessionHandler;
pub use protocol::{
    methods, InitializeResult, McpError, McpHandler, McpRequest, McpResponse, ToolCallResult,
    ToolContent, ToolDefinition, JSONRPC_VERSION, PROTOCOL_VERSION,
};
pub use tools::{get_tool_definitions, Tool, TOOL_DEFINITIONS};

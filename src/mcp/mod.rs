//! MCP server.
//!
//! Exposes the memory operations as Model Context Protocol tools:
//! `simple_memory_add`, `simple_memory_list`, `simple_memory_search`,
//! `simple_memory_delete` and `simple_memory_status`.
//!
//! ## Claude Desktop configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "simple-memory": {
//!       "command": "simple-memory",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

// Allow unused_self for methods kept for API consistency.
#![allow(clippy::unused_self)]

mod dispatch;
#[cfg(feature = "http")]
pub mod http;
mod server;
mod tool_types;
mod tools;

pub use dispatch::McpMethod;
pub use server::{
    INVALID_PARAMS, INVALID_REQUEST, MAX_REQUEST_BODY_SIZE, METHOD_NOT_FOUND, McpServer,
    PARSE_ERROR, PROTOCOL_VERSION, SERVER_NAME, format_error,
};
pub use tool_types::{AddArgs, NoArgs, QueryArgs, parse_args};
pub use tools::{
    ADD_TOOL, DELETE_TOOL, LIST_TOOL, NO_MATCHES_TEXT, SEARCH_TOOL, STATUS_TOOL, ToolContent,
    ToolDefinition, ToolRegistry, ToolResult,
};

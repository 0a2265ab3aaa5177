//! MCP tool implementations.
//!
//! - [`definitions`]: tool schemas (JSON Schema for input validation)
//! - [`handlers`]: tool execution against the [`MemoryService`]

mod definitions;
mod handlers;

pub use handlers::NO_MATCHES_TEXT;

use crate::services::MemoryService;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Tool that appends a memory.
pub const ADD_TOOL: &str = "simple_memory_add";
/// Tool that lists every memory.
pub const LIST_TOOL: &str = "simple_memory_list";
/// Tool that finds memories containing a substring.
pub const SEARCH_TOOL: &str = "simple_memory_search";
/// Tool that deletes memories containing a substring.
pub const DELETE_TOOL: &str = "simple_memory_delete";
/// Tool that summarizes the store.
pub const STATUS_TOOL: &str = "simple_memory_status";

/// Registry of MCP tools bound to one memory service.
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    service: Arc<MemoryService>,
}

impl ToolRegistry {
    /// Creates a registry exposing every simple-memory tool.
    #[must_use]
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self {
            tools: vec![
                definitions::add_tool(),
                definitions::list_tool(),
                definitions::search_tool(),
                definitions::delete_tool(),
                definitions::status_tool(),
            ],
            service,
        }
    }

    /// Returns all tool definitions in a stable order.
    #[must_use]
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown tool or bad arguments,
    /// or the service error of the underlying operation.
    pub fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let service = self.service.as_ref();
        match name {
            ADD_TOOL => handlers::execute_add(service, arguments),
            LIST_TOOL => handlers::execute_list(service, arguments),
            SEARCH_TOOL => handlers::execute_search(service, arguments),
            DELETE_TOOL => handlers::execute_delete(service, arguments),
            STATUS_TOOL => handlers::execute_status(service, arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful single-text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// A failed single-text result.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Concatenated text of all text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect()
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

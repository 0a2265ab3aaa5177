//! Tool definitions for MCP tools.

use super::{ADD_TOOL, DELETE_TOOL, LIST_TOOL, SEARCH_TOOL, STATUS_TOOL, ToolDefinition};

/// Defines the add tool.
pub fn add_tool() -> ToolDefinition {
    ToolDefinition {
        name: ADD_TOOL.to_string(),
        description: "Append a memory to the simple-memory database, with an optional title, tags and status."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The memory to add. Must not be blank."
                },
                "title": {
                    "type": "string",
                    "description": "Optional short title"
                },
                "tags": {
                    "type": "string",
                    "description": "Optional free-form tags, e.g. \"db,decision\""
                },
                "status": {
                    "type": "string",
                    "description": "Optional status label, e.g. \"open\" or \"done\""
                }
            },
            "required": ["content"]
        }),
    }
}

/// Defines the list tool.
pub fn list_tool() -> ToolDefinition {
    ToolDefinition {
        name: LIST_TOOL.to_string(),
        description: "List all simple-memories, oldest first, as a JSON array.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// Defines the search tool.
pub fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL.to_string(),
        description: "Search for simple-memories whose content, title, tags or status contains the query substring (case-sensitive).".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Substring to search for in simple-memories."
                }
            },
            "required": ["query"]
        }),
    }
}

/// Defines the delete tool.
pub fn delete_tool() -> ToolDefinition {
    ToolDefinition {
        name: DELETE_TOOL.to_string(),
        description: "Delete all simple-memories that the same search query would return.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Substring to match for deletion."
                }
            },
            "required": ["query"]
        }),
    }
}

/// Defines the status tool.
pub fn status_tool() -> ToolDefinition {
    ToolDefinition {
        name: STATUS_TOOL.to_string(),
        description: "Report the storage backend, database path, memory count and server version."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_tools_require_query() {
        for tool in [search_tool(), delete_tool()] {
            assert_eq!(tool.input_schema["required"], serde_json::json!(["query"]));
        }
    }

    #[test]
    fn test_add_requires_content_only() {
        let tool = add_tool();
        assert_eq!(tool.input_schema["required"], serde_json::json!(["content"]));
        for field in ["title", "tags", "status"] {
            assert_eq!(tool.input_schema["properties"][field]["type"], "string");
        }
    }
}

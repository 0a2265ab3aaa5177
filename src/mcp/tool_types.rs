//! Argument types for MCP tools.
//!
//! All argument types use `#[serde(deny_unknown_fields)]` so a misspelled
//! field is reported instead of silently ignored.

use crate::models::AddMemory;
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Arguments for `simple_memory_add`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddArgs {
    /// The note text. Older clients send it as `memory`.
    #[serde(alias = "memory")]
    pub content: String,
    /// Optional short title.
    pub title: Option<String>,
    /// Optional free-form tags.
    pub tags: Option<String>,
    /// Optional status label.
    pub status: Option<String>,
}

impl From<AddArgs> for AddMemory {
    fn from(args: AddArgs) -> Self {
        Self {
            content: args.content,
            title: args.title,
            tags: args.tags,
            status: args.status,
        }
    }
}

/// Arguments for `simple_memory_search` and `simple_memory_delete`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryArgs {
    /// Substring to match.
    pub query: String,
}

/// Arguments for tools that take none.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// Decodes tool arguments, treating `null` as an empty object.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the decode failure.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(format!("invalid params: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_args_accepts_memory_alias() {
        let args: AddArgs = parse_args(json!({ "memory": "note" })).unwrap();
        assert_eq!(args.content, "note");
        assert!(args.title.is_none());
    }

    #[test]
    fn test_add_args_full() {
        let args: AddArgs = parse_args(json!({
            "content": "note",
            "title": "T",
            "tags": "a,b",
            "status": "open"
        }))
        .unwrap();
        let request = AddMemory::from(args);
        assert_eq!(request.tags.as_deref(), Some("a,b"));
        assert_eq!(request.status.as_deref(), Some("open"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = parse_args::<QueryArgs>(json!({ "query": "x", "limit": 3 })).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("limit")));
    }

    #[test]
    fn test_missing_query_rejected() {
        assert!(parse_args::<QueryArgs>(json!({})).is_err());
    }

    #[test]
    fn test_null_means_no_args() {
        assert!(parse_args::<NoArgs>(Value::Null).is_ok());
    }
}

//! Memory tool handlers.
//!
//! Each handler decodes its arguments, makes one service call and renders
//! the outcome as text. Service errors propagate; the server turns them
//! into `isError` results.

use crate::mcp::tool_types::{AddArgs, NoArgs, QueryArgs, parse_args};
use crate::models::{AddMemory, MemoryRecord, SearchOutcome};
use crate::services::MemoryService;
use crate::{Error, Result};
use serde_json::Value;

use super::super::ToolResult;

/// Text returned when a search selects nothing.
pub const NO_MATCHES_TEXT: &str = "No matching simple-memories found.";

/// Maximum accepted content length (1 MiB).
const MAX_CONTENT_LENGTH: usize = 1_048_576;

/// Maximum accepted query length (10 KiB).
const MAX_QUERY_LENGTH: usize = 10_240;

fn validate_input_length(input: &str, field_name: &str, max_length: usize) -> Result<()> {
    if input.len() > max_length {
        return Err(Error::InvalidInput(format!(
            "{field_name} exceeds maximum length ({} > {max_length} bytes)",
            input.len()
        )));
    }
    Ok(())
}

fn render_records(records: &[MemoryRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| Error::OperationFailed {
        operation: "render_records".to_string(),
        cause: e.to_string(),
    })
}

/// Executes `simple_memory_add`.
pub fn execute_add(service: &MemoryService, arguments: Value) -> Result<ToolResult> {
    let args: AddArgs = parse_args(arguments)?;
    validate_input_length(&args.content, "content", MAX_CONTENT_LENGTH)?;

    let outcome = service.add(AddMemory::from(args))?;
    Ok(ToolResult::text(outcome.message()))
}

/// Executes `simple_memory_list`.
pub fn execute_list(service: &MemoryService, arguments: Value) -> Result<ToolResult> {
    let NoArgs {} = parse_args(arguments)?;
    let records = service.list()?;
    Ok(ToolResult::text(render_records(&records)?))
}

/// Executes `simple_memory_search`.
pub fn execute_search(service: &MemoryService, arguments: Value) -> Result<ToolResult> {
    let args: QueryArgs = parse_args(arguments)?;
    validate_input_length(&args.query, "query", MAX_QUERY_LENGTH)?;

    match service.search(&args.query)? {
        SearchOutcome::Matches(records) => Ok(ToolResult::text(render_records(&records)?)),
        SearchOutcome::NoMatches => Ok(ToolResult::text(NO_MATCHES_TEXT)),
    }
}

/// Executes `simple_memory_delete`.
pub fn execute_delete(service: &MemoryService, arguments: Value) -> Result<ToolResult> {
    let args: QueryArgs = parse_args(arguments)?;
    validate_input_length(&args.query, "query", MAX_QUERY_LENGTH)?;

    let outcome = service.delete(&args.query)?;
    Ok(ToolResult::text(outcome.message()))
}

/// Executes `simple_memory_status`.
pub fn execute_status(service: &MemoryService, arguments: Value) -> Result<ToolResult> {
    let NoArgs {} = parse_args(arguments)?;
    let status = service.status()?;
    let text = serde_json::to_string_pretty(&status).map_err(|e| Error::OperationFailed {
        operation: "render_status".to_string(),
        cause: e.to_string(),
    })?;
    Ok(ToolResult::text(text))
}

//! # Simple Memory
//!
//! A persistent note store for AI agents.
//!
//! Memories are short notes with optional title, tags and status. They are
//! kept in a single `SQLite` table and exposed to agents through four MCP
//! tools: add, list, search and delete.
//!
//! ## Features
//!
//! - Single shared `SQLite` store in WAL mode (readers never wait on writers)
//! - Additive schema evolution: optional columns are added on startup
//! - Case-sensitive substring search over title, tags, status and content
//! - Search and delete share one predicate: what search shows is what delete removes
//! - MCP server over stdio, HTTP or SSE
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use simple_memory::{AddMemory, MemoryService, SearchOutcome};
//! use simple_memory::storage::SqliteMemoryStore;
//!
//! let store = Arc::new(SqliteMemoryStore::in_memory()?);
//! let service = MemoryService::new(store);
//!
//! service.add(AddMemory::new("Project uses SQLite").with_tags("db"))?;
//! let outcome = service.search("SQLite")?;
//! assert!(matches!(outcome, SearchOutcome::Matches(ref hits) if hits.len() == 1));
//! # Ok::<(), simple_memory::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::MemoryConfig;
pub use models::{
    AddMemory, AddOutcome, DeleteOutcome, MatchQuery, MemoryRecord, NewMemory, SearchOutcome,
    StoredMemory,
};
pub use services::MemoryService;
pub use storage::{InMemoryStore, MemoryStore, SqliteMemoryStore};

/// Error type for simple-memory operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty content on add, empty query on search/delete, malformed tool arguments |
/// | `ReadFailed` | A list/search/count statement fails |
/// | `WriteFailed` | An insert or delete statement fails |
/// | `StoreUnavailable` | The database cannot be opened or the table cannot be created |
/// | `OperationFailed` | Config, log sink or transport I/O fails |
/// | `FeatureNotEnabled` | HTTP/SSE transport requested without the `http` feature |
///
/// Only `StoreUnavailable` is fatal; everything else is reported to the
/// caller and the server keeps running.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A read against the store failed.
    #[error("read '{operation}' failed: {cause}")]
    ReadFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A write against the store failed.
    #[error("write '{operation}' failed: {cause}")]
    WriteFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The store could not be opened or its schema could not be created.
    #[error("store unavailable at {path}: {cause}")]
    StoreUnavailable {
        /// Location of the store.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// A non-store operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Returns true if the process cannot continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Result type alias for simple-memory operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("content cannot be empty".to_string());
        assert_eq!(err.to_string(), "invalid input: content cannot be empty");

        let err = Error::ReadFailed {
            operation: "scan".to_string(),
            cause: "disk I/O error".to_string(),
        };
        assert_eq!(err.to_string(), "read 'scan' failed: disk I/O error");

        let err = Error::WriteFailed {
            operation: "insert".to_string(),
            cause: "database is locked".to_string(),
        };
        assert_eq!(err.to_string(), "write 'insert' failed: database is locked");

        let err = Error::StoreUnavailable {
            path: "/nope/db".to_string(),
            cause: "unable to open database file".to_string(),
        };
        assert!(err.to_string().starts_with("store unavailable at /nope/db"));
    }

    #[test]
    fn test_only_store_unavailable_is_fatal() {
        assert!(
            Error::StoreUnavailable {
                path: String::new(),
                cause: String::new(),
            }
            .is_fatal()
        );
        assert!(!Error::InvalidInput(String::new()).is_fatal());
        assert!(
            !Error::WriteFailed {
                operation: String::new(),
                cause: String::new(),
            }
            .is_fatal()
        );
    }
}

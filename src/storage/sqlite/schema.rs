//! Table creation and additive column migration.
//!
//! The table started life as `(id, content, created_at)`. Later versions
//! added `title`, `tags` and `status`. On every open the store creates the
//! base table if needed, then adds whichever optional columns are missing.
//! Nothing is ever dropped or renamed.

use super::sql::{CREATE_TABLE, TABLE};
use crate::models::OptionalField;
use crate::{Error, Result};
use rusqlite::Connection;
use std::collections::HashSet;

/// The optional columns present in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnSet {
    title: bool,
    tags: bool,
    status: bool,
}

impl ColumnSet {
    /// A set with no optional columns.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            title: false,
            tags: false,
            status: false,
        }
    }

    /// A set with every optional column.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            title: true,
            tags: true,
            status: true,
        }
    }

    /// Returns this set with `field` added.
    #[must_use]
    pub const fn with(mut self, field: OptionalField) -> Self {
        match field {
            OptionalField::Title => self.title = true,
            OptionalField::Tags => self.tags = true,
            OptionalField::Status => self.status = true,
        }
        self
    }

    /// Returns true if the column exists.
    #[must_use]
    pub const fn contains(self, field: OptionalField) -> bool {
        match field {
            OptionalField::Title => self.title,
            OptionalField::Tags => self.tags,
            OptionalField::Status => self.status,
        }
    }

    /// Returns true if every optional column exists.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.title && self.tags && self.status
    }

    /// Iterates the present columns in canonical order.
    pub fn present(self) -> impl Iterator<Item = OptionalField> {
        OptionalField::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }

    /// Iterates the missing columns in canonical order.
    pub fn missing(self) -> impl Iterator<Item = OptionalField> {
        OptionalField::ALL
            .into_iter()
            .filter(move |field| !self.contains(*field))
    }
}

/// Creates the base table if it does not exist.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the statement fails.
pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_TABLE, [])
        .map(|_| ())
        .map_err(|e| Error::OperationFailed {
            operation: "create_simple_memories_table".to_string(),
            cause: e.to_string(),
        })
}

/// Reads the column names of the table.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the table cannot be introspected.
pub fn table_columns(conn: &Connection) -> Result<HashSet<String>> {
    let introspect_failed = |e: rusqlite::Error| Error::OperationFailed {
        operation: "table_info".to_string(),
        cause: e.to_string(),
    };
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({TABLE})"))
        .map_err(introspect_failed)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(introspect_failed)?
        .collect::<std::result::Result<HashSet<_>, _>>()
        .map_err(introspect_failed)?;
    Ok(names)
}

/// Returns the optional columns currently present.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the table cannot be introspected.
pub fn present_columns(conn: &Connection) -> Result<ColumnSet> {
    let names = table_columns(conn)?;
    Ok(OptionalField::ALL
        .into_iter()
        .filter(|field| names.contains(field.as_str()))
        .fold(ColumnSet::empty(), ColumnSet::with))
}

/// Adds any missing optional columns.
///
/// Each column is attempted independently. A failed `ALTER TABLE` is logged
/// and counted, and that column is reported as missing so reads substitute
/// `''` for it. Running this against a complete table does nothing.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] only if the table cannot be
/// introspected at all.
pub fn migrate_optional_columns(conn: &Connection) -> Result<ColumnSet> {
    let mut columns = present_columns(conn)?;

    for field in columns.missing().collect::<Vec<_>>() {
        let sql = format!("ALTER TABLE {TABLE} ADD COLUMN {field} TEXT");
        match conn.execute(&sql, []) {
            Ok(_) => {
                tracing::info!(column = %field, "Added column to {TABLE}");
                columns = columns.with(field);
            },
            Err(e) => {
                tracing::warn!(column = %field, error = %e, "Failed to add column to {TABLE}");
                metrics::counter!(
                    "storage_migration_failures_total",
                    "column" => field.as_str()
                )
                .increment(1);
            },
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_TABLE: &str = "CREATE TABLE simple_memories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )";

    #[test]
    fn test_column_set_iterators() {
        let columns = ColumnSet::empty().with(OptionalField::Status);
        assert_eq!(columns.present().collect::<Vec<_>>(), vec![OptionalField::Status]);
        assert_eq!(
            columns.missing().collect::<Vec<_>>(),
            vec![OptionalField::Title, OptionalField::Tags]
        );
        assert!(!columns.is_complete());
        assert!(ColumnSet::all().is_complete());
    }

    #[test]
    fn test_fresh_table_gets_all_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_table(&conn).unwrap();
        assert_eq!(present_columns(&conn).unwrap(), ColumnSet::empty());

        let columns = migrate_optional_columns(&conn).unwrap();
        assert!(columns.is_complete());
        assert!(table_columns(&conn).unwrap().contains("status"));
    }

    #[test]
    fn test_migration_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_table(&conn).unwrap();
        migrate_optional_columns(&conn).unwrap();
        let before = table_columns(&conn).unwrap();

        let columns = migrate_optional_columns(&conn).unwrap();
        assert!(columns.is_complete());
        assert_eq!(table_columns(&conn).unwrap(), before);
    }

    #[test]
    fn test_partial_table_gets_remaining_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(LEGACY_TABLE, []).unwrap();
        conn.execute("ALTER TABLE simple_memories ADD COLUMN tags TEXT", [])
            .unwrap();
        conn.execute(
            "INSERT INTO simple_memories (content, tags) VALUES ('old', 'x')",
            [],
        )
        .unwrap();

        create_table(&conn).unwrap();
        let columns = migrate_optional_columns(&conn).unwrap();
        assert!(columns.is_complete());

        let (content, tags): (String, String) = conn
            .query_row("SELECT content, tags FROM simple_memories", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!((content.as_str(), tags.as_str()), ("old", "x"));
    }

    #[test]
    fn test_failed_alter_reports_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(LEGACY_TABLE, []).unwrap();
        conn.pragma_update(None, "query_only", true).unwrap();

        let columns = migrate_optional_columns(&conn).unwrap();
        assert_eq!(columns, ColumnSet::empty());
    }
}

//! SQL text for the `simple_memories` table.
//!
//! Every statement that selects by query text builds its `WHERE` clause from
//! [`match_clause`], so search and delete always select the same rows.
//!
//! Matching uses `instr` rather than `LIKE`: `instr` is case-sensitive and
//! byte-exact, and `%` or `_` in the query need no escaping.
//!
//! Rows whose content is blank are never selected, counted or deleted.
//! [`CONTENT_PRESENT`] is part of every statement that reads or removes rows.

use super::schema::ColumnSet;
use crate::models::OptionalField;

/// Name of the memories table.
pub const TABLE: &str = "simple_memories";

/// Creates the base table. Optional columns are added separately.
pub const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS simple_memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

/// Characters stripped before deciding content is blank. Must agree with
/// [`CONTENT_PRESENT`].
pub const BLANK_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// True for rows whose content is non-blank after stripping [`BLANK_CHARS`].
pub const CONTENT_PRESENT: &str = "trim(content, ' ' || char(9, 10, 13)) <> ''";

/// Counts the rows list would return.
pub const COUNT: &str =
    "SELECT COUNT(*) FROM simple_memories WHERE trim(content, ' ' || char(9, 10, 13)) <> ''";

/// Returns the select expression for an optional column.
///
/// Present columns have NULL folded to `''`; missing columns select a
/// constant `''` under the same name.
fn optional_expr(columns: ColumnSet, field: OptionalField) -> String {
    let name = field.as_str();
    if columns.contains(field) {
        format!("COALESCE({name}, '') AS {name}")
    } else {
        format!("'' AS {name}")
    }
}

/// Builds the `WHERE` predicate for a query bound as `?1`.
///
/// A row matches when its content is not blank and `?1` occurs in its
/// content or in any optional column the table has.
#[must_use]
pub fn match_clause(columns: ColumnSet) -> String {
    let mut terms = vec!["instr(content, ?1) > 0".to_string()];
    terms.extend(
        columns
            .present()
            .map(|field| format!("instr(COALESCE({field}, ''), ?1) > 0")),
    );
    format!("{CONTENT_PRESENT} AND ({})", terms.join(" OR "))
}

/// Builds the select statement for list (`matching = false`) or search.
///
/// Columns are always `id, title, tags, status, content, created_at`, in
/// ascending id order.
#[must_use]
pub fn select_sql(columns: ColumnSet, matching: bool) -> String {
    let optional: Vec<String> = OptionalField::ALL
        .iter()
        .map(|field| optional_expr(columns, *field))
        .collect();
    let filter = if matching {
        match_clause(columns)
    } else {
        CONTENT_PRESENT.to_string()
    };
    format!(
        "SELECT id, {}, content, created_at FROM {TABLE} WHERE {filter} ORDER BY id ASC",
        optional.join(", ")
    )
}

/// Builds the delete statement for a query bound as `?1`.
#[must_use]
pub fn delete_sql(columns: ColumnSet) -> String {
    format!("DELETE FROM {TABLE} WHERE {}", match_clause(columns))
}

/// Builds the insert statement.
///
/// Binds content as `?1` followed by each present optional column in
/// [`OptionalField::ALL`] order. Returns the assigned id and timestamp.
#[must_use]
pub fn insert_sql(columns: ColumnSet) -> String {
    let mut names = vec!["content"];
    names.extend(columns.present().map(OptionalField::as_str));
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({}) RETURNING id, created_at",
        names.join(", "),
        placeholders.join(", ")
    )
}

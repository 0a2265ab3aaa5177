//! Row conversion for the `simple_memories` table.
//!
//! Rows are read tolerantly. Stored text that is not valid UTF-8 is decoded
//! lossily, unexpected value types are rendered as text, and a row whose
//! content is missing or blank is skipped instead of failing the whole
//! read. The statements already filter blank content; the check here uses
//! the same character set so a row slipping past one never passes the other.

use super::sql::BLANK_CHARS;
use crate::models::MemoryRecord;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::Row;
use rusqlite::types::ValueRef;

/// Column positions produced by [`super::sql::select_sql`].
const ID: usize = 0;
const TITLE: usize = 1;
const TAGS: usize = 2;
const STATUS: usize = 3;
const CONTENT: usize = 4;
const CREATED_AT: usize = 5;

/// Converts a selected row into a record.
///
/// Returns `Ok(None)` for rows with blank content.
///
/// # Errors
///
/// Returns the underlying error if the id or a column cannot be read.
pub fn read_record(row: &Row<'_>) -> rusqlite::Result<Option<MemoryRecord>> {
    let id: i64 = row.get(ID)?;
    let content = text_or_empty(row.get_ref(CONTENT)?);
    if content.trim_matches(BLANK_CHARS).is_empty() {
        tracing::debug!(id, "Skipping row with empty content");
        return Ok(None);
    }

    Ok(Some(MemoryRecord {
        id,
        title: text_or_empty(row.get_ref(TITLE)?),
        tags: text_or_empty(row.get_ref(TAGS)?),
        status: text_or_empty(row.get_ref(STATUS)?),
        content,
        created_at: parse_created_at(id, row.get_ref(CREATED_AT)?),
    }))
}

/// Renders any stored value as text. NULL becomes `""`.
#[must_use]
pub fn text_or_empty(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Parses a stored creation timestamp.
///
/// Accepts RFC 3339 (what the table default writes), the
/// `YYYY-MM-DD HH:MM:SS` form of `CURRENT_TIMESTAMP` used by older tables,
/// and unix seconds. Anything else falls back to the unix epoch.
#[must_use]
pub fn parse_created_at(id: i64, value: ValueRef<'_>) -> DateTime<Utc> {
    let parsed = match value {
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            parse_timestamp_text(text.trim())
        },
        ValueRef::Integer(secs) => Utc.timestamp_opt(secs, 0).single(),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!(id, "Unreadable created_at, using unix epoch");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

//! `SQLite` record store.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition with poison recovery, pragmas, opening connections
//! - [`schema`]: table creation and additive column migration ([`ColumnSet`])
//! - [`sql`]: statement text, including the shared match predicate
//! - [`memory_row`]: tolerant row conversion to [`MemoryRecord`](crate::models::MemoryRecord)
//! - [`store`]: [`SqliteMemoryStore`], the [`MemoryStore`](crate::storage::MemoryStore) implementation

mod connection;
mod memory_row;
mod schema;
mod sql;
mod store;

pub use connection::{BUSY_TIMEOUT, acquire_lock, configure_connection, try_acquire_lock};
pub use memory_row::{parse_created_at, read_record, text_or_empty};
pub use schema::{ColumnSet, create_table, migrate_optional_columns, present_columns};
pub use sql::{
    BLANK_CHARS, CONTENT_PRESENT, TABLE, delete_sql, insert_sql, match_clause, select_sql,
};
pub use store::{READER_POOL_SIZE, SqliteMemoryStore};

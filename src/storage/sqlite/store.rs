//! `SQLite`-backed memory store.

use super::connection::{acquire_lock, open_reader, open_writer, try_acquire_lock};
use super::memory_row::{parse_created_at, read_record};
use super::schema::{ColumnSet, create_table, migrate_optional_columns};
use super::sql::{COUNT, delete_sql, insert_sql, select_sql};
use crate::models::{MatchQuery, MemoryRecord, NewMemory, StoredMemory};
use crate::storage::metrics::{record_operation_metrics, status_label};
use crate::storage::traits::MemoryStore;
use crate::{Error, Result};
use rusqlite::{Connection, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::instrument;

/// Number of read-only connections opened for a file-backed store.
pub const READER_POOL_SIZE: usize = 4;

const BACKEND: &str = "sqlite";

/// Statement text, built once from the column set found at open.
#[derive(Debug)]
struct Statements {
    insert: String,
    select_all: String,
    select_matching: String,
    delete: String,
}

impl Statements {
    fn new(columns: ColumnSet) -> Self {
        Self {
            insert: insert_sql(columns),
            select_all: select_sql(columns, false),
            select_matching: select_sql(columns, true),
            delete: delete_sql(columns),
        }
    }
}

/// `SQLite`-backed memory store.
///
/// # Concurrency Model
///
/// One writer connection behind a `Mutex` serializes inserts and deletes.
/// File-backed stores also keep a small pool of read-only connections, so
/// list and search run in parallel with each other and with the writer.
/// WAL mode gives each read a consistent snapshot of the last commit.
///
/// In-memory stores cannot share their database across connections, so
/// reads go through the writer connection.
///
/// # Schema
///
/// `simple_memories(id, content, created_at)` plus the nullable optional
/// columns `title`, `tags` and `status`, added on open when missing. If a
/// column cannot be added the store still works: inserts skip it and reads
/// report it as `""`.
#[derive(Debug)]
pub struct SqliteMemoryStore {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    columns: ColumnSet,
    statements: Statements,
    db_path: Option<PathBuf>,
}

impl SqliteMemoryStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// Creates the parent directory, the table, and any missing optional
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the file cannot be opened or
    /// the table cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use simple_memory::SqliteMemoryStore;
    ///
    /// let store = SqliteMemoryStore::open("/var/lib/agent/simple_memories.db")?;
    /// # Ok::<(), simple_memory::Error>(())
    /// ```
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::StoreUnavailable {
                path: db_path.display().to_string(),
                cause: e.to_string(),
            })?;
        }

        let writer = open_writer(&db_path)?;
        let columns = Self::initialize(&writer, &db_path.display().to_string())?;
        let readers = (0..READER_POOL_SIZE)
            .map(|_| open_reader(&db_path).map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            path = %db_path.display(),
            readers = readers.len(),
            "Opened SQLite memory store"
        );

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
            columns,
            statements: Statements::new(columns),
            db_path: Some(db_path),
        })
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be
    /// initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::StoreUnavailable {
            path: ":memory:".to_string(),
            cause: e.to_string(),
        })?;
        let columns = Self::initialize(&conn, ":memory:")?;
        Ok(Self::from_connection(conn, columns))
    }

    fn from_connection(conn: Connection, columns: ColumnSet) -> Self {
        Self {
            writer: Mutex::new(conn),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
            columns,
            statements: Statements::new(columns),
            db_path: None,
        }
    }

    /// Creates the table and adds missing optional columns.
    fn initialize(conn: &Connection, location: &str) -> Result<ColumnSet> {
        let unavailable = |e: Error| Error::StoreUnavailable {
            path: location.to_string(),
            cause: e.to_string(),
        };
        create_table(conn).map_err(unavailable)?;
        let columns = migrate_optional_columns(conn).map_err(unavailable)?;
        if !columns.is_complete() {
            tracing::warn!(
                missing = ?columns.missing().collect::<Vec<_>>(),
                "Running with optional columns missing; they will read as empty"
            );
        }
        Ok(columns)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Returns the optional columns this store reads and writes.
    #[must_use]
    pub const fn columns(&self) -> ColumnSet {
        self.columns
    }

    /// Flushes the WAL into the main database file.
    ///
    /// Called on shutdown. A no-op for in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if the checkpoint fails.
    pub fn checkpoint(&self) -> Result<()> {
        if self.db_path.is_none() {
            return Ok(());
        }
        let conn = acquire_lock(&self.writer);
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .map_err(|e| Error::WriteFailed {
                operation: "wal_checkpoint".to_string(),
                cause: e.to_string(),
            })?;
        tracing::debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Takes a reader connection, preferring an idle one.
    ///
    /// Falls back to the writer for in-memory stores.
    fn reader(&self) -> MutexGuard<'_, Connection> {
        let count = self.readers.len();
        if count == 0 {
            return acquire_lock(&self.writer);
        }
        let first = self.next_reader.fetch_add(1, Ordering::Relaxed);
        (0..count)
            .find_map(|offset| try_acquire_lock(&self.readers[(first + offset) % count]))
            .unwrap_or_else(|| acquire_lock(&self.readers[first % count]))
    }
}

impl MemoryStore for SqliteMemoryStore {
    #[instrument(skip(self, memory), fields(operation = "insert", backend = BACKEND))]
    fn insert(&self, memory: &NewMemory) -> Result<StoredMemory> {
        let start = Instant::now();
        let result = (|| {
            let mut values = vec![Some(memory.content())];
            values.extend(self.columns.present().map(|field| memory.field(field)));
            for field in self.columns.missing() {
                if memory.field(field).is_some() {
                    tracing::warn!(column = %field, "Column missing, value not stored");
                }
            }

            let conn = acquire_lock(&self.writer);
            let write_failed = |e: rusqlite::Error| Error::WriteFailed {
                operation: "insert".to_string(),
                cause: e.to_string(),
            };
            let mut stmt = conn
                .prepare_cached(&self.statements.insert)
                .map_err(write_failed)?;
            stmt.query_row(params_from_iter(values), |row| {
                let id: i64 = row.get(0)?;
                Ok(StoredMemory {
                    id,
                    created_at: parse_created_at(id, row.get_ref(1)?),
                })
            })
            .map_err(write_failed)
        })();

        record_operation_metrics(BACKEND, "insert", start, status_label(&result));
        result
    }

    #[instrument(skip(self, query, visit), fields(operation = "scan", backend = BACKEND, query = ?query.map(MatchQuery::as_str)))]
    fn scan(
        &self,
        query: Option<&MatchQuery>,
        visit: &mut dyn FnMut(MemoryRecord),
    ) -> Result<usize> {
        let start = Instant::now();
        let operation = if query.is_some() { "scan_matching" } else { "scan_all" };
        let result = (|| {
            let read_failed = |e: rusqlite::Error| Error::ReadFailed {
                operation: operation.to_string(),
                cause: e.to_string(),
            };
            let sql = if query.is_some() {
                &self.statements.select_matching
            } else {
                &self.statements.select_all
            };

            let conn = self.reader();
            let mut stmt = conn.prepare_cached(sql).map_err(read_failed)?;
            let mut rows = match query {
                Some(q) => stmt.query(params![q.as_str()]),
                None => stmt.query([]),
            }
            .map_err(read_failed)?;

            let mut visited = 0;
            while let Some(row) = rows.next().map_err(read_failed)? {
                if let Some(record) = read_record(row).map_err(read_failed)? {
                    visit(record);
                    visited += 1;
                }
            }
            Ok(visited)
        })();

        record_operation_metrics(BACKEND, operation, start, status_label(&result));
        result
    }

    #[instrument(skip(self, query), fields(operation = "delete_matching", backend = BACKEND, query = %query))]
    fn delete_matching(&self, query: &MatchQuery) -> Result<usize> {
        let start = Instant::now();
        let result = (|| {
            let write_failed = |e: rusqlite::Error| Error::WriteFailed {
                operation: "delete_matching".to_string(),
                cause: e.to_string(),
            };
            let conn = acquire_lock(&self.writer);
            let mut stmt = conn
                .prepare_cached(&self.statements.delete)
                .map_err(write_failed)?;
            stmt.execute(params![query.as_str()]).map_err(write_failed)
        })();

        record_operation_metrics(BACKEND, "delete_matching", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "count", backend = BACKEND))]
    fn count(&self) -> Result<usize> {
        let start = Instant::now();
        let result = (|| {
            let conn = self.reader();
            let count: i64 = conn
                .query_row(COUNT, [], |row| row.get(0))
                .map_err(|e| Error::ReadFailed {
                    operation: "count".to_string(),
                    cause: e.to_string(),
                })?;
            Ok(usize::try_from(count).unwrap_or(0))
        })();

        record_operation_metrics(BACKEND, "count", start, status_label(&result));
        result
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn location(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionalField;

    fn new_memory(content: &str) -> NewMemory {
        NewMemory::new(content).unwrap()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        let first = store.insert(&new_memory("one")).unwrap();
        let second = store.insert(&new_memory("two")).unwrap();
        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        let first = store.insert(&new_memory("temp")).unwrap();
        store
            .delete_matching(&MatchQuery::parse("temp").unwrap())
            .unwrap();
        let second = store.insert(&new_memory("next")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_round_trip_optional_fields() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        let stored = store
            .insert(&new_memory("body").with_title("X").with_status("open"))
            .unwrap();

        let records = store.collect(None).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, stored.id);
        assert_eq!(record.title, "X");
        assert_eq!(record.tags, "");
        assert_eq!(record.status, "open");
        assert_eq!(record.content, "body");
        assert_eq!(record.created_at, stored.created_at);
    }

    #[test]
    fn test_scan_matching_and_delete_agree() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        store.insert(&new_memory("alpha").with_tags("shared")).unwrap();
        store.insert(&new_memory("beta")).unwrap();
        store.insert(&new_memory("gamma shared")).unwrap();

        let query = MatchQuery::parse("shared").unwrap();
        let matched = store.collect(Some(&query)).unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(store.delete_matching(&query).unwrap(), matched.len());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_scan_visits_in_id_order() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        for content in ["c", "a", "b"] {
            store.insert(&new_memory(content)).unwrap();
        }

        let mut ids = Vec::new();
        let visited = store.scan(None, &mut |record| ids.push(record.id)).unwrap();
        assert_eq!(visited, 3);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_blank_content_rows_are_invisible_to_every_operation() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        acquire_lock(&store.writer)
            .execute_batch(
                "INSERT INTO simple_memories (content, title) VALUES (' \t\r\n', 'go corrupt');
                 INSERT INTO simple_memories (content) VALUES ('real go note');",
            )
            .unwrap();

        let query = MatchQuery::parse("go").unwrap();
        let matched = store.collect(Some(&query)).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(store.collect(None).unwrap().len(), 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.delete_matching(&query).unwrap(), matched.len());

        let remaining: i64 = acquire_lock(&store.writer)
            .query_row("SELECT COUNT(*) FROM simple_memories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn test_missing_columns_read_as_empty() {
        let conn = Connection::open_in_memory().unwrap();
        create_table(&conn).unwrap();
        let store = SqliteMemoryStore::from_connection(conn, ColumnSet::empty());

        store
            .insert(&new_memory("legacy body").with_title("dropped"))
            .unwrap();
        let records = store.collect(None).unwrap();
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].content, "legacy body");

        // Matching only considers columns that exist.
        let by_title = MatchQuery::parse("dropped").unwrap();
        assert!(store.collect(Some(&by_title)).unwrap().is_empty());
        assert_eq!(store.delete_matching(&by_title).unwrap(), 0);
        assert!(!store.columns().contains(OptionalField::Title));
    }

    #[test]
    fn test_file_store_uses_reader_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memories.db");
        let store = SqliteMemoryStore::open(&path).unwrap();
        assert_eq!(store.readers.len(), READER_POOL_SIZE);
        assert_eq!(store.location(), Some(path.as_path()));

        store.insert(&new_memory("persisted")).unwrap();
        // Reader connections see the writer's commit.
        assert_eq!(store.collect(None).unwrap().len(), 1);
        store.checkpoint().unwrap();
    }

    #[test]
    fn test_reader_skips_busy_connections() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteMemoryStore::open(dir.path().join("busy.db")).unwrap();
        let held: Vec<_> = store.readers.iter().skip(1).map(acquire_lock).collect();
        assert_eq!(held.len(), READER_POOL_SIZE - 1);
        assert_eq!(store.count().unwrap(), 0);
    }
}

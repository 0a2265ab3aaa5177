//! Connection handling for the `SQLite` store.
//!
//! Lock acquisition with poison recovery, pragma configuration, and opening
//! the writer and reader connections.

use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

/// How long a statement waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Acquires a mutex, recovering the inner value if it was poisoned.
///
/// A panic while holding a connection leaves the connection itself usable,
/// so later operations continue instead of failing forever.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Tries to acquire a mutex without blocking.
///
/// Returns `None` if another thread holds it. Poison is recovered the same
/// way as [`acquire_lock`].
pub fn try_acquire_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            Some(poisoned.into_inner())
        },
        Err(TryLockError::WouldBlock) => None,
    }
}

/// Configures a connection for concurrent use.
///
/// - **WAL mode**: readers see the last committed state and never block the writer
/// - **NORMAL synchronous**: durable at every WAL checkpoint
/// - **`busy_timeout`**: waits up to 5 seconds for locks instead of failing immediately
///
/// In-memory databases report journal mode `memory`; that is accepted.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a pragma cannot be applied.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    let mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|e| Error::OperationFailed {
            operation: "set_journal_mode".to_string(),
            cause: e.to_string(),
        })?;
    if !mode.eq_ignore_ascii_case("wal") {
        tracing::debug!(journal_mode = %mode, "WAL not available for this database");
    }

    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| Error::OperationFailed {
            operation: "set_synchronous".to_string(),
            cause: e.to_string(),
        })?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| Error::OperationFailed {
            operation: "set_busy_timeout".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}

/// Opens the writer connection for a database file.
///
/// # Errors
///
/// Returns [`Error::StoreUnavailable`] if the file cannot be opened.
pub fn open_writer(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| Error::StoreUnavailable {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    configure_connection(&conn).map_err(|e| Error::StoreUnavailable {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    Ok(conn)
}

/// Opens a read-only connection to an existing database file.
///
/// The database must already be in WAL mode, which is persistent once the
/// writer has set it.
///
/// # Errors
///
/// Returns [`Error::StoreUnavailable`] if the file cannot be opened.
pub fn open_reader(path: &Path) -> Result<Connection> {
    let unavailable = |e: rusqlite::Error| Error::StoreUnavailable {
        path: path.display().to_string(),
        cause: e.to_string(),
    };
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(unavailable)?;
    conn.pragma_update(None, "query_only", true)
        .map_err(unavailable)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    *acquire_lock(&mutex) += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*acquire_lock(&mutex), 10);
    }

    #[test]
    fn test_acquire_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 1);
        assert_eq!(try_acquire_lock(&mutex).map(|g| *g), Some(1));
    }

    #[test]
    fn test_try_acquire_lock_would_block() {
        let mutex = Mutex::new(0);
        let _held = acquire_lock(&mutex);
        assert!(try_acquire_lock(&mutex).is_none());
    }

    #[test]
    fn test_configure_connection_file_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_writer(&dir.path().join("wal.db")).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_configure_connection_in_memory() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(configure_connection(&conn).is_ok());
    }

    #[test]
    fn test_reader_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        let writer = open_writer(&path).unwrap();
        writer.execute("CREATE TABLE t (x INTEGER)", []).unwrap();

        let reader = open_reader(&path).unwrap();
        assert!(reader.execute("INSERT INTO t (x) VALUES (1)", []).is_err());
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_writer_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_writer(&dir.path().join("missing").join("db.sqlite"));
        assert!(matches!(result, Err(Error::StoreUnavailable { .. })));
    }
}

//! Memory operation service.
//!
//! The four operations agents call: add, list, search and delete. Each one
//! validates its input, runs a single store operation, and translates the
//! result. Successful mutations are reported to the activity sink.

use crate::models::{
    AddMemory, AddOutcome, DeleteOutcome, MatchQuery, MemoryRecord, OptionalField, SearchOutcome,
};
use crate::observability::{ActivityNotice, ActivitySink, DisabledActivityLog};
use crate::storage::MemoryStore;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Store summary reported by the status tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Backend name.
    pub backend: &'static str,
    /// Backing file, if any.
    pub location: Option<PathBuf>,
    /// Number of stored memories.
    pub count: usize,
    /// Crate version.
    pub version: &'static str,
}

/// Service for memory operations.
///
/// Cheap to share: clone the `Arc` it lives in, not the service.
pub struct MemoryService {
    store: Arc<dyn MemoryStore>,
    activity: Arc<dyn ActivitySink>,
}

impl MemoryService {
    /// Creates a service with the activity log disabled.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            activity: Arc::new(DisabledActivityLog),
        }
    }

    /// Sets the activity sink.
    #[must_use]
    pub fn with_activity_sink(mut self, activity: Arc<dyn ActivitySink>) -> Self {
        self.activity = activity;
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Adds a memory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the content is blank (nothing
    /// is stored), or [`crate::Error::WriteFailed`] if the insert fails.
    #[instrument(skip(self, request), fields(content_len = request.content.len()))]
    pub fn add(&self, request: AddMemory) -> Result<AddOutcome> {
        let memory = request.validate()?;
        let stored = self.store.insert(&memory)?;
        tracing::info!(id = stored.id, "Added memory");

        let field = |f| memory.field(f).unwrap_or_default().to_string();
        self.activity.record(&ActivityNotice::Added {
            id: stored.id,
            title: field(OptionalField::Title),
            tags: field(OptionalField::Tags),
            status: field(OptionalField::Status),
            content: memory.content().to_string(),
        });

        Ok(AddOutcome {
            id: stored.id,
            created_at: stored.created_at,
        })
    }

    /// Lists every memory in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] if the read fails.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<MemoryRecord>> {
        self.store.collect(None)
    }

    /// Returns memories whose title, tags, status or content contains the
    /// query (case-sensitive), in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the query is blank, or
    /// [`crate::Error::ReadFailed`] if the read fails.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = MatchQuery::parse(query)?;
        let records = self.store.collect(Some(&query))?;
        tracing::debug!(matches = records.len(), "Search complete");
        Ok(SearchOutcome::from_records(records))
    }

    /// Deletes every memory [`MemoryService::search`] would return for the
    /// same query.
    ///
    /// Zero matches is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the query is blank, or
    /// [`crate::Error::WriteFailed`] if the delete fails.
    #[instrument(skip(self))]
    pub fn delete(&self, query: &str) -> Result<DeleteOutcome> {
        let query = MatchQuery::parse(query)?;
        let removed = self.store.delete_matching(&query)?;
        tracing::info!(removed, "Deleted memories");

        self.activity.record(&ActivityNotice::Deleted {
            query: query.as_str().to_string(),
            removed,
        });

        Ok(DeleteOutcome { removed })
    }

    /// Summarizes the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] if the count fails.
    pub fn status(&self) -> Result<StoreStatus> {
        Ok(StoreStatus {
            backend: self.store.backend_name(),
            location: self.store.location().map(PathBuf::from),
            count: self.store.count()?,
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::models::{MemoryRecord, NewMemory, StoredMemory};
    use crate::storage::{InMemoryStore, SqliteMemoryStore};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        notices: Mutex<Vec<ActivityNotice>>,
    }

    impl ActivitySink for RecordingSink {
        fn record(&self, notice: &ActivityNotice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    impl MemoryStore for BrokenStore {
        fn insert(&self, _memory: &NewMemory) -> Result<StoredMemory> {
            Err(Error::WriteFailed {
                operation: "insert".to_string(),
                cause: "disk full".to_string(),
            })
        }

        fn scan(
            &self,
            _query: Option<&MatchQuery>,
            _visit: &mut dyn FnMut(MemoryRecord),
        ) -> Result<usize> {
            Err(Error::ReadFailed {
                operation: "scan".to_string(),
                cause: "disk I/O error".to_string(),
            })
        }

        fn delete_matching(&self, _query: &MatchQuery) -> Result<usize> {
            Err(Error::WriteFailed {
                operation: "delete_matching".to_string(),
                cause: "database is locked".to_string(),
            })
        }

        fn count(&self) -> Result<usize> {
            Ok(0)
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn service() -> (MemoryService, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let service = MemoryService::new(Arc::new(SqliteMemoryStore::in_memory().unwrap()))
            .with_activity_sink(sink.clone());
        (service, sink)
    }

    #[test]
    fn test_add_then_list() {
        let (service, sink) = service();
        let outcome = service
            .add(AddMemory::new("  Project uses SQLite  ").with_tags("db"))
            .unwrap();

        let records = service.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, outcome.id);
        assert_eq!(records[0].content, "Project uses SQLite");
        assert_eq!(records[0].tags, "db");

        let notices = sink.notices.lock().unwrap();
        assert!(matches!(&notices[0], ActivityNotice::Added { id, .. } if *id == outcome.id));
    }

    #[test]
    fn test_add_blank_content_stores_nothing() {
        let (service, sink) = service();
        assert!(matches!(service.add(AddMemory::new("   ")), Err(Error::InvalidInput(_))));
        assert!(service.list().unwrap().is_empty());
        assert!(sink.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn test_search_no_matches() {
        let (service, _) = service();
        service.add(AddMemory::new("alpha")).unwrap();
        assert_eq!(service.search("beta").unwrap(), SearchOutcome::NoMatches);
    }

    #[test]
    fn test_blank_query_rejected() {
        let (service, _) = service();
        assert!(matches!(service.search("  "), Err(Error::InvalidInput(_))));
        assert!(matches!(service.delete(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_delete_records_notice_even_when_nothing_matched() {
        let (service, sink) = service();
        let outcome = service.delete("nothing").unwrap();
        assert_eq!(outcome.removed, 0);
        assert_eq!(
            sink.notices.lock().unwrap().as_slice(),
            &[ActivityNotice::Deleted {
                query: "nothing".to_string(),
                removed: 0,
            }]
        );
    }

    #[test]
    fn test_store_failures_propagate() {
        let service = MemoryService::new(Arc::new(BrokenStore));
        assert!(matches!(service.add(AddMemory::new("x")), Err(Error::WriteFailed { .. })));
        assert!(matches!(service.list(), Err(Error::ReadFailed { .. })));
        assert!(matches!(service.search("x"), Err(Error::ReadFailed { .. })));
        assert!(matches!(service.delete("x"), Err(Error::WriteFailed { .. })));
    }

    #[test]
    fn test_status() {
        let service = MemoryService::new(Arc::new(InMemoryStore::new()));
        service.add(AddMemory::new("one")).unwrap();
        let status = service.status().unwrap();
        assert_eq!(status.backend, "memory");
        assert_eq!(status.count, 1);
        assert_eq!(status.location, None);
    }
}

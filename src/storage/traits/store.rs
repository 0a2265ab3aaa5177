//! Record store trait.

use crate::Result;
use crate::models::{MatchQuery, MemoryRecord, NewMemory, StoredMemory};
use std::path::Path;

/// Trait for memory record stores.
///
/// A store is the single source of truth for memories. It is shared by all
/// concurrent callers, so every method takes `&self`; implementations
/// serialize writes internally and must let reads proceed while a write is
/// in flight.
///
/// Reads are ordered by ascending id. `query = None` selects every record,
/// `Some(q)` selects the records [`MatchQuery::matches`] accepts.
pub trait MemoryStore: Send + Sync {
    /// Persists a new memory and returns its assigned identity.
    fn insert(&self, memory: &NewMemory) -> Result<StoredMemory>;

    /// Streams records to `visit` in ascending id order.
    ///
    /// Returns the number of records visited. Each call re-runs the read,
    /// so a scan can be restarted by calling again.
    fn scan(&self, query: Option<&MatchQuery>, visit: &mut dyn FnMut(MemoryRecord))
    -> Result<usize>;

    /// Removes every record the query matches, returning how many.
    fn delete_matching(&self, query: &MatchQuery) -> Result<usize>;

    /// Returns the number of stored records.
    fn count(&self) -> Result<usize>;

    /// Short backend name for logs and metrics labels.
    fn backend_name(&self) -> &'static str;

    /// Location of the backing file, if any.
    fn location(&self) -> Option<&Path> {
        None
    }

    /// Collects a scan into a vector.
    fn collect(&self, query: Option<&MatchQuery>) -> Result<Vec<MemoryRecord>> {
        let mut records = Vec::new();
        self.scan(query, &mut |record| records.push(record))?;
        Ok(records)
    }
}

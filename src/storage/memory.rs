//! In-process memory store.
//!
//! Holds records in a `BTreeMap` keyed by id. Used for `--ephemeral` runs
//! and as a reference implementation in tests: it applies
//! [`MatchQuery::matches`] directly, so its results define what the `SQLite`
//! predicate must agree with.

use crate::models::{MatchQuery, MemoryRecord, NewMemory, OptionalField, StoredMemory};
use crate::storage::metrics::{record_operation_metrics, status_label};
use crate::storage::traits::MemoryStore;
use crate::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

const BACKEND: &str = "memory";

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    records: BTreeMap<i64, MemoryRecord>,
}

/// In-process memory store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for InMemoryStore {
    fn insert(&self, memory: &NewMemory) -> Result<StoredMemory> {
        let start = Instant::now();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.last_id += 1;
        let record = MemoryRecord {
            id: state.last_id,
            title: field_or_empty(memory, OptionalField::Title),
            tags: field_or_empty(memory, OptionalField::Tags),
            status: field_or_empty(memory, OptionalField::Status),
            content: memory.content().to_string(),
            created_at: Utc::now(),
        };
        let stored = StoredMemory {
            id: record.id,
            created_at: record.created_at,
        };
        state.records.insert(record.id, record);
        drop(state);

        record_operation_metrics(BACKEND, "insert", start, "success");
        Ok(stored)
    }

    fn scan(
        &self,
        query: Option<&MatchQuery>,
        visit: &mut dyn FnMut(MemoryRecord),
    ) -> Result<usize> {
        let start = Instant::now();
        // Snapshot first so the visitor runs without the lock held.
        let snapshot: Vec<MemoryRecord> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state
                .records
                .values()
                .filter(|record| query.is_none_or(|q| q.matches(record)))
                .cloned()
                .collect()
        };
        let visited = snapshot.len();
        snapshot.into_iter().for_each(visit);

        let result = Ok(visited);
        record_operation_metrics(BACKEND, "scan", start, status_label(&result));
        result
    }

    fn delete_matching(&self, query: &MatchQuery) -> Result<usize> {
        let start = Instant::now();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.records.len();
        state.records.retain(|_, record| !query.matches(record));
        let removed = before - state.records.len();
        drop(state);

        record_operation_metrics(BACKEND, "delete_matching", start, "success");
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.records.len())
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

fn field_or_empty(memory: &NewMemory, field: OptionalField) -> String {
    memory.field(field).unwrap_or_default().to_string()
}

//! Property-based tests for query semantics.
//!
//! Uses proptest to check, across random record sets and queries:
//! - the `SQLite` store and the in-memory store select the same records
//! - delete removes exactly what search returned
//! - list stays in ascending id order

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use simple_memory::models::{AddMemory, MatchQuery};
use simple_memory::{InMemoryStore, MemoryService, SqliteMemoryStore};
use std::sync::Arc;

/// Short strings over a small alphabet so queries hit often. Includes the
/// characters `LIKE` would treat specially.
fn text() -> impl Strategy<Value = String> {
    "[abAB%_ ]{0,6}"
}

fn add_request() -> impl Strategy<Value = AddMemory> {
    (
        "[abAB%_]{1,6}",
        prop::option::of(text()),
        prop::option::of(text()),
        prop::option::of(text()),
    )
        .prop_map(|(content, title, tags, status)| AddMemory {
            content,
            title,
            tags,
            status,
        })
}

fn query() -> impl Strategy<Value = String> {
    "[abAB%_]{1,3}"
}

fn populate(requests: &[AddMemory]) -> (MemoryService, MemoryService) {
    let sqlite = MemoryService::new(Arc::new(SqliteMemoryStore::in_memory().unwrap()));
    let memory = MemoryService::new(Arc::new(InMemoryStore::new()));
    for request in requests {
        sqlite.add(request.clone()).unwrap();
        memory.add(request.clone()).unwrap();
    }
    (sqlite, memory)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: both backends select the same ids and fields.
    #[test]
    fn prop_backends_agree_on_search(
        requests in prop::collection::vec(add_request(), 0..12),
        q in query(),
    ) {
        let (sqlite, memory) = populate(&requests);
        let from_sqlite = sqlite.search(&q).unwrap().into_records();
        let from_memory = memory.search(&q).unwrap().into_records();

        let key = |r: &simple_memory::models::MemoryRecord| {
            (r.id, r.title.clone(), r.tags.clone(), r.status.clone(), r.content.clone())
        };
        prop_assert_eq!(
            from_sqlite.iter().map(key).collect::<Vec<_>>(),
            from_memory.iter().map(key).collect::<Vec<_>>()
        );
    }

    /// Property: every returned record matches, and every unreturned one does not.
    #[test]
    fn prop_search_is_exact(
        requests in prop::collection::vec(add_request(), 0..12),
        q in query(),
    ) {
        let (sqlite, _) = populate(&requests);
        let matcher = MatchQuery::parse(&q).unwrap();
        let all = sqlite.list().unwrap();
        let found: Vec<i64> = sqlite.search(&q).unwrap().into_records().iter().map(|r| r.id).collect();

        for record in &all {
            prop_assert_eq!(matcher.matches(record), found.contains(&record.id));
        }
    }

    /// Property: delete count equals the prior search length, and the
    /// survivors are exactly the non-matches.
    #[test]
    fn prop_delete_mirrors_search(
        requests in prop::collection::vec(add_request(), 0..12),
        q in query(),
    ) {
        let (sqlite, _) = populate(&requests);
        let before = sqlite.list().unwrap();
        let matched = sqlite.search(&q).unwrap().len();

        prop_assert_eq!(sqlite.delete(&q).unwrap().removed, matched);

        let after = sqlite.list().unwrap();
        prop_assert_eq!(after.len(), before.len() - matched);
        prop_assert!(sqlite.search(&q).unwrap().is_empty());
    }

    /// Property: list is ascending by id after arbitrary adds and deletes.
    #[test]
    fn prop_list_ascending(
        requests in prop::collection::vec(add_request(), 0..16),
        q in query(),
    ) {
        let (sqlite, _) = populate(&requests);
        sqlite.delete(&q).unwrap();
        sqlite.add(AddMemory::new("tail")).unwrap();

        let ids: Vec<i64> = sqlite.list().unwrap().iter().map(|r| r.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    /// Property: whitespace-only input is always rejected.
    #[test]
    fn prop_blank_input_rejected(blank in "[ \t\n]{0,8}") {
        let (sqlite, _) = populate(&[]);
        prop_assert!(sqlite.add(AddMemory::new(blank.clone())).is_err());
        prop_assert!(sqlite.search(&blank).is_err());
        prop_assert!(sqlite.delete(&blank).is_err());
        prop_assert!(sqlite.list().unwrap().is_empty());
    }
}

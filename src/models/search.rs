//! Match predicate and query outcomes.
//!
//! [`MatchQuery`] is the single definition of "which memories does this
//! query select". Search reads with it and delete removes with it, so the
//! two operations always agree.

use super::{MemoryRecord, OptionalField};
use crate::{Error, Result};
use std::fmt;

/// A trimmed, non-empty substring query.
///
/// A record matches when the query occurs, case-sensitively, anywhere in its
/// title, tags, status or content. There is no tokenization, wildcard or
/// ranking: `%`, `_` and `*` are ordinary characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchQuery(String);

impl MatchQuery {
    /// Parses a raw query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the query is empty after trimming.
    pub fn parse(raw: &str) -> Result<Self> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".to_string()));
        }
        Ok(Self(query.to_string()))
    }

    /// Returns the query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the record matches this query.
    #[must_use]
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        record.content.contains(self.as_str())
            || OptionalField::ALL
                .iter()
                .any(|field| record.field(*field).contains(self.as_str()))
    }
}

impl fmt::Display for MatchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a search.
///
/// An empty result is reported as [`SearchOutcome::NoMatches`], distinct
/// from a successful list that happens to be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one memory matched, in ascending id order.
    Matches(Vec<MemoryRecord>),
    /// Nothing matched.
    NoMatches,
}

impl SearchOutcome {
    /// Builds an outcome from matched records.
    #[must_use]
    pub fn from_records(records: Vec<MemoryRecord>) -> Self {
        if records.is_empty() {
            Self::NoMatches
        } else {
            Self::Matches(records)
        }
    }

    /// Number of matched memories.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Matches(records) => records.len(),
            Self::NoMatches => 0,
        }
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::NoMatches)
    }

    /// Returns the matched records (empty for no matches).
    #[must_use]
    pub fn into_records(self) -> Vec<MemoryRecord> {
        match self {
            Self::Matches(records) => records,
            Self::NoMatches => Vec::new(),
        }
    }
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Number of memories removed. Zero is a successful no-op.
    pub removed: usize,
}

impl DeleteOutcome {
    /// Confirmation text for the caller.
    #[must_use]
    pub fn message(&self) -> String {
        if self.removed == 0 {
            "No simple-memories deleted (no match).".to_string()
        } else {
            format!("Deleted {} simple-memories.", self.removed)
        }
    }
}

//! Data models for simple-memory.
//!
//! This module contains the record type, the validated insert request, the
//! shared match predicate and the outcomes returned by the operation façade.

mod add;
mod memory;
mod search;

pub use add::{AddMemory, AddOutcome};
pub use memory::{MemoryRecord, NewMemory, OptionalField, StoredMemory};
pub use search::{DeleteOutcome, MatchQuery, SearchOutcome};

//! Storage layer.
//!
//! A single table of memory records behind the [`MemoryStore`] trait:
//! - [`SqliteMemoryStore`]: durable `SQLite` storage in WAL mode
//! - [`InMemoryStore`]: process-local storage for tests and ephemeral runs

// Dropping database guards slightly earlier provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

mod memory;
pub mod metrics;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;
pub use traits::MemoryStore;

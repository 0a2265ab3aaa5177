//! Storage backend traits.

mod store;

pub use store::MemoryStore;

//! Business logic services.

mod memory;

pub use memory::{MemoryService, StoreStatus};

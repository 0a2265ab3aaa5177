//! Tool execution handlers.

mod memory;

pub use memory::{
    NO_MATCHES_TEXT, execute_add, execute_delete, execute_list, execute_search, execute_status,
};

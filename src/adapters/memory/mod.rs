//! In-memory adapters for testing and single-node development.

mod session_table;

pub use session_table::InMemorySessionTable;

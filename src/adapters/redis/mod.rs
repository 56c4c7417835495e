//! Redis adapter - session items with native TTL and a sorted-set user index.

mod session_table;

pub use session_table::RedisSessionTable;

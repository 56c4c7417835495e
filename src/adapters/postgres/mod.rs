//! PostgreSQL adapter - session table backed by a `sessions` table.
//!
//! - `PostgresSessionTable` - conditional writes via `ON CONFLICT ... WHERE`
//! - `spawn_expiry_reaper` - background deletion of expired rows

mod session_table;

pub use session_table::{spawn_expiry_reaper, PostgresSessionTable};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the session handlers and the outside world. Adapters implement these ports.
//!
//! - `SessionTable` - Keyed storage with a username index and item expiry
//! - `Clock` - Current time, replaceable in tests
//! - `SessionIdGenerator` - Collision-resistant key generation

mod clock;
mod session_id_generator;
mod session_table;

pub use clock::Clock;
pub use session_id_generator::SessionIdGenerator;
pub use session_table::{IndexEntry, PutOutcome, SessionTable, TableError};

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the session handlers to external systems:
//! - `memory` - In-process session table for tests and development
//! - `redis` - Session table on Redis with native key expiry
//! - `postgres` - Session table on PostgreSQL with a background reaper
//! - `timeout` - Per-call deadline decorator for any session table
//! - `system` - Wall clock and random id generation
//! - `http` - REST API over the session handlers

pub mod http;
pub mod memory;
pub mod postgres;
pub mod redis;
pub mod system;
pub mod timeout;

pub use memory::InMemorySessionTable;
pub use postgres::{spawn_expiry_reaper, PostgresSessionTable};
pub use self::redis::RedisSessionTable;
pub use system::{ManualClock, RandomSessionIdGenerator, SystemClock};
pub use timeout::TimeoutSessionTable;

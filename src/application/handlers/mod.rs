//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod session;

pub use session::{
    CreateSessionCommand, CreateSessionHandler, DeleteUserSessionsCommand,
    DeleteUserSessionsHandler, DeleteUserSessionsResult, GetSessionHandler, GetSessionQuery,
    SessionPolicy,
};

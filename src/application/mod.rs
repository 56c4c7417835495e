//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (create, delete) are separate from the query handler (get).

pub mod handlers;

pub use handlers::{
    CreateSessionCommand, CreateSessionHandler, DeleteUserSessionsCommand,
    DeleteUserSessionsHandler, DeleteUserSessionsResult, GetSessionHandler, GetSessionQuery,
    SessionPolicy,
};

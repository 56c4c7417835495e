//! Session command and query handlers.

mod create_session;
mod delete_user_sessions;
mod get_session;

pub use create_session::{CreateSessionCommand, CreateSessionHandler, SessionPolicy};
pub use delete_user_sessions::{
    DeleteUserSessionsCommand, DeleteUserSessionsHandler, DeleteUserSessionsResult,
};
pub use get_session::{GetSessionHandler, GetSessionQuery};

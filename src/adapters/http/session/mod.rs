//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateSessionRequest, DeleteSessionsResponse, ErrorResponse, SessionLookupParams,
    SessionResponse,
};
pub use handlers::SessionHandlers;
pub use routes::session_routes;

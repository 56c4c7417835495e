//! Session domain module.
//!
//! A session is a keyed, expiring record associating a user with opaque
//! state. Sessions are read by id and bulk-destroyed per user.

mod aggregate;
mod errors;

pub use aggregate::Session;
pub use errors::SessionError;

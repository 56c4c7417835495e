//! Domain layer containing the session model and its invariants.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, validation errors)
//! - `session` - The session entity and its error taxonomy

pub mod foundation;
pub mod session;

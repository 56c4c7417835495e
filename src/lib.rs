//! Session Store - expiring key-value sessions with per-user lookup.
//!
//! Sessions are created, read by id and bulk-deleted by username over HTTP.
//! Storage is pluggable behind the [`ports::SessionTable`] port: in-memory,
//! Redis or PostgreSQL.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use app::{build_router, AppDependencies};

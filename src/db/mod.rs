/// Database module for taskmind
///
/// Task model types and the SQLite-backed task store.
/// Implements connection pooling for performance.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::Database;
pub use models::*;

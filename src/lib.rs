/// taskmind library
///
/// Task list storage plus a rule-based engine that reads the list and
/// suggests edits to it.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod intelligence;

// Re-exports for convenience
pub use config::EngineConfig;
pub use db::Database;
pub use error::{Result, TaskmindError};

//! Roster - a reactive local user directory
//!
//! This library provides the core functionality shared by the roster
//! command-line tools: a SQLite-backed user table, a repository with a live
//! query subscription, and a state holder that republishes snapshots to any
//! number of observers.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod prefs;
pub mod remote;
pub mod repo;
pub mod service;
pub mod types;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{Result, RosterError};
pub use repo::UserRepository;
pub use service::RosterService;
pub use types::User;

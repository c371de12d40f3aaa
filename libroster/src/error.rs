//! Error types for Roster

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RosterError>;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RosterError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RosterError::InvalidInput(_) => 3,
            RosterError::Config(_) => 2,
            RosterError::Database(_) => 2,
            RosterError::Remote(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid duration '{value}' for {field}: {source}")]
    InvalidDuration {
        field: String,
        value: String,
        source: humantime::DurationError,
    },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(
        "Schema version mismatch: found {found}, expected {expected}. \
         Set database.destructive_migration = true to drop and recreate (data loss)"
    )]
    SchemaVersionMismatch { found: i64, expected: i64 },

    #[error("Change feed closed")]
    ChangeFeedClosed,
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} fetching profile '{username}'")]
    Status { status: u16, username: String },
}

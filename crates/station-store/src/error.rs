//! Error types for station-store.

use std::path::PathBuf;

/// Result type for station-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in station-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Sensor not found in database.
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// A sensor with this identity already exists.
    #[error("Sensor already exists: {0}")]
    SensorExists(String),

    /// A stored value could not be decoded.
    #[error("Invalid stored value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    /// Invalid timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

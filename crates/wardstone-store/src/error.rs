//! Error types for the store crate.

use thiserror::Error;

use wardstone_core::Coordinate;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The configured driver name is not in the supported set.
    #[error("driver \"{0}\" is not supported")]
    UnsupportedDriver(String),

    /// The backend failed to connect at startup.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The store is in degraded mode; no backend is connected.
    #[error("storage is unavailable")]
    Unavailable,

    /// A protection already exists at the coordinate.
    #[error("protection already exists at {0}")]
    Duplicate(Coordinate),

    /// No protection exists at the coordinate.
    #[error("no protection at {0}")]
    NotFound(Coordinate),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Persisted data could not be mapped back to the model.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

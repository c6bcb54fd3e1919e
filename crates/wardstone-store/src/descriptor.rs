//! Backend configuration: the storage descriptor and driver resolution.
//!
//! A [`StorageDescriptor`] is resolved once at startup into a concrete
//! backend and never mutated afterward. Driver names map to a fixed,
//! enumerable set of variants; an unrecognized name is an
//! [`StoreError::UnsupportedDriver`](crate::StoreError::UnsupportedDriver)
//! surfaced at connect time, not a panic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// The supported storage drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Driver {
    /// Transient in-process storage. No durability, no failure modes.
    Memory,
    /// Durable SQLite file storage.
    Sqlite,
}

impl Driver {
    /// Resolve a configured driver name. Case-insensitive.
    pub fn resolve(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "memory" => Ok(Driver::Memory),
            "sqlite" => Ok(Driver::Sqlite),
            _ => Err(StoreError::UnsupportedDriver(name.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Memory => write!(f, "memory"),
            Driver::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Configuration for one storage connection.
///
/// Mirrors the `database.*` configuration keys. Not every field applies to
/// every driver: SQLite uses `path` and `prefix`; the hostname and credential
/// fields are carried for network drivers and ignored otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageDescriptor {
    /// Driver name, resolved via [`Driver::resolve`].
    pub driver: String,
    pub hostname: String,
    pub database: String,
    /// Filesystem path for file-backed drivers.
    pub path: String,
    /// Prefix applied to every table name.
    pub prefix: String,
    pub username: String,
    pub password: String,
}

impl StorageDescriptor {
    /// A descriptor selecting the transient memory backend.
    pub fn memory() -> Self {
        Self {
            driver: "memory".to_string(),
            ..Default::default()
        }
    }

    /// A descriptor selecting SQLite at the given path.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: "sqlite".to_string(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Resolve the configured driver name.
    pub fn resolve_driver(&self) -> Result<Driver> {
        Driver::resolve(&self.driver)
    }
}

//! Error taxonomy for the protection service.
//!
//! Every façade operation returns one of these typed errors; translation to
//! user-facing text is the messaging collaborator's job, not the core's.

use thiserror::Error;

use wardstone_core::{AccessLevel, Coordinate, RoleError};
use wardstone_store::StoreError;

/// Errors surfaced by [`ProtectionService`](crate::ProtectionService)
/// operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The target resource cannot be protected, or the request was
    /// malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A protection already exists at the coordinate.
    #[error("a protection already exists at {0}")]
    Duplicate(Coordinate),

    /// No protection exists at the coordinate.
    #[error("no protection at {0}")]
    NotFound(Coordinate),

    /// The actor's resolved access level is insufficient for the requested
    /// mutation.
    #[error("requires {required} access, actor resolved to {actual}")]
    Permission {
        required: AccessLevel,
        actual: AccessLevel,
    },

    /// Role-list mutation rejected by a protection invariant.
    #[error("role error: {0}")]
    Role(#[from] RoleError),

    /// Backend I/O failure, including degraded-mode unavailability.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        // Coordinate-shaped store outcomes fold into the façade taxonomy;
        // everything else stays a storage error.
        match e {
            StoreError::Duplicate(c) => ServiceError::Duplicate(c),
            StoreError::NotFound(c) => ServiceError::NotFound(c),
            other => ServiceError::Storage(other),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

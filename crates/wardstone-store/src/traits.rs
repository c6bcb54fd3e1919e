//! The ProtectionStore trait: the abstract interface for protection
//! persistence.
//!
//! This trait keeps the location index storage-agnostic. Implementations
//! include SQLite (durable) and in-memory (transient).

use async_trait::async_trait;

use wardstone_core::{Coordinate, Protection, ProtectionId};

use crate::error::Result;

/// The async interface every storage backend implements.
///
/// All methods are async to let the SQLite backend hop to `spawn_blocking`
/// without blocking the caller's runtime. Implementations must be safe to
/// call from multiple threads; the connection itself is a singleton owned by
/// the [`ConnectionManager`](crate::ConnectionManager).
///
/// # Design Notes
///
/// - **One protection per coordinate**: `insert` fails with
///   [`StoreError::Duplicate`](crate::StoreError::Duplicate) if the
///   coordinate is already protected.
/// - **Absence is normal**: `load` returns `Ok(None)` for an unprotected
///   coordinate, and `delete` reports absence via its boolean rather than an
///   error, so idempotent removal stays cheap for callers.
#[async_trait]
pub trait ProtectionStore: Send + Sync {
    /// Insert a new protection, returning its backend-assigned id.
    ///
    /// The incoming protection carries `ProtectionId::UNASSIGNED`; the
    /// caller is responsible for stamping the returned id onto its copy.
    async fn insert(&self, protection: &Protection) -> Result<ProtectionId>;

    /// Rewrite a protection's fields and role list.
    async fn update(&self, protection: &Protection) -> Result<()>;

    /// Delete the protection at a coordinate.
    ///
    /// Returns `true` if a protection was deleted, `false` if none existed.
    async fn delete(&self, coordinate: &Coordinate) -> Result<bool>;

    /// Load the protection at a coordinate, if any.
    async fn load(&self, coordinate: &Coordinate) -> Result<Option<Protection>>;

    /// Load every stored protection. Used for startup warm caching and
    /// consistency audits.
    async fn load_all(&self) -> Result<Vec<Protection>>;
}

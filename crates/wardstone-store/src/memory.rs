//! In-memory implementation of the ProtectionStore trait.
//!
//! The transient backend: same contract as SQLite, no durability, no real
//! connect failure mode. Selected by `driver = "memory"`; also the natural
//! backend for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use wardstone_core::{Coordinate, Protection, ProtectionId};

use crate::error::{Result, StoreError};
use crate::traits::ProtectionStore;

/// Transient in-process backend.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
pub struct MemoryBackend {
    inner: RwLock<MemoryBackendInner>,
}

struct MemoryBackendInner {
    /// Protections indexed by coordinate.
    protections: HashMap<Coordinate, Protection>,
    /// Next id to assign on insert.
    next_id: i64,
}

impl MemoryBackend {
    /// Create a new empty memory backend.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryBackendInner {
                protections: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtectionStore for MemoryBackend {
    async fn insert(&self, protection: &Protection) -> Result<ProtectionId> {
        let mut inner = self.inner.write().unwrap();

        if inner.protections.contains_key(&protection.coordinate) {
            return Err(StoreError::Duplicate(protection.coordinate.clone()));
        }

        let id = ProtectionId(inner.next_id);
        inner.next_id += 1;

        let mut stored = protection.clone();
        stored.id = id;
        inner.protections.insert(stored.coordinate.clone(), stored);

        Ok(id)
    }

    async fn update(&self, protection: &Protection) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        match inner.protections.get_mut(&protection.coordinate) {
            Some(existing) => {
                *existing = protection.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(protection.coordinate.clone())),
        }
    }

    async fn delete(&self, coordinate: &Coordinate) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.protections.remove(coordinate).is_some())
    }

    async fn load(&self, coordinate: &Coordinate) -> Result<Option<Protection>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.protections.get(coordinate).cloned())
    }

    async fn load_all(&self) -> Result<Vec<Protection>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.protections.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn protection(world: &str, x: i64) -> Protection {
        Protection::new(Uuid::new_v4(), Coordinate::new(world, x, 64, 0), 1000)
    }

    #[tokio::test]
    async fn insert_and_load() {
        let backend = MemoryBackend::new();
        let p = protection("w", 1);

        let id = backend.insert(&p).await.unwrap();
        assert!(id.is_assigned());

        let loaded = backend.load(&p.coordinate).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.owner, p.owner);
        assert_eq!(loaded.roles(), p.roles());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_coordinate() {
        let backend = MemoryBackend::new();
        let p = protection("w", 1);

        backend.insert(&p).await.unwrap();
        let other = protection("w", 1);
        let err = backend.insert(&other).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(c) if c == p.coordinate));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let backend = MemoryBackend::new();
        let a = backend.insert(&protection("w", 1)).await.unwrap();
        let b = backend.insert(&protection("w", 2)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let backend = MemoryBackend::new();
        let p = protection("w", 1);
        backend.insert(&p).await.unwrap();

        assert!(backend.delete(&p.coordinate).await.unwrap());
        assert!(!backend.delete(&p.coordinate).await.unwrap());
        assert!(backend.load(&p.coordinate).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let p = protection("w", 1);
        let err = backend.update(&p).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_all_returns_everything() {
        let backend = MemoryBackend::new();
        backend.insert(&protection("w", 1)).await.unwrap();
        backend.insert(&protection("w", 2)).await.unwrap();
        backend.insert(&protection("nether", 1)).await.unwrap();

        let all = backend.load_all().await.unwrap();
        assert_eq!(all.len(), 3);
    }
}

//! The location index: the in-memory coordinate -> protection map.
//!
//! Read-through and write-through in front of the storage backend. The cache
//! is the only shared mutable structure; mutations serialize on a single
//! lock (contention is low, correctness is the constraint) and always write
//! the backend before touching the cache, so a failed backend write never
//! leaves a cache entry the durable store does not know about.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use wardstone_core::{Coordinate, Protection};
use wardstone_store::{ConnectionManager, ProtectionStore, Result as StoreResult, StoreError};

/// In-memory index of protections keyed by coordinate.
///
/// Owned exclusively by the protection service; the index in turn is the
/// sole writer of cached protections.
pub struct LocationIndex {
    store: Arc<ConnectionManager>,
    cache: RwLock<HashMap<Coordinate, Protection>>,
    /// Serializes create/remove/commit so concurrent mutators on one
    /// coordinate observe exactly one winner.
    mutation: Mutex<()>,
    /// Coordinates whose `accessed` bump has not been persisted yet.
    dirty_access: Mutex<HashSet<Coordinate>>,
}

impl LocationIndex {
    pub fn new(store: Arc<ConnectionManager>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            mutation: Mutex::new(()),
            dirty_access: Mutex::new(HashSet::new()),
        }
    }

    /// Look up the protection at a coordinate.
    ///
    /// Cache hits return immediately; a miss loads from the backend and
    /// populates the cache. Absence in the backend is a normal miss.
    pub async fn lookup(&self, coordinate: &Coordinate) -> StoreResult<Option<Protection>> {
        if let Some(protection) = self.cache.read().await.get(coordinate) {
            return Ok(Some(protection.clone()));
        }

        // The miss path holds the mutation lock across load-and-insert so a
        // concurrent remove cannot land between the backend read and the
        // cache insert and leave a deleted protection resurrected in the
        // cache. Double-checked: a mutator may have filled the entry while
        // we waited for the lock.
        let _guard = self.mutation.lock().await;
        if let Some(protection) = self.cache.read().await.get(coordinate) {
            return Ok(Some(protection.clone()));
        }

        match self.store.load(coordinate).await? {
            Some(protection) => {
                self.cache
                    .write()
                    .await
                    .insert(coordinate.clone(), protection.clone());
                Ok(Some(protection))
            }
            None => Ok(None),
        }
    }

    /// Create a protection owned by `owner` at `coordinate`.
    ///
    /// Exactly one of any set of concurrent creators on the same coordinate
    /// succeeds; the rest observe [`StoreError::Duplicate`]. The backend
    /// write happens before the cache insert.
    pub async fn create(
        &self,
        owner: uuid::Uuid,
        coordinate: Coordinate,
        now: i64,
    ) -> StoreResult<Protection> {
        let _guard = self.mutation.lock().await;

        if self.cache.read().await.contains_key(&coordinate) {
            return Err(StoreError::Duplicate(coordinate));
        }

        let mut protection = Protection::new(owner, coordinate, now);
        protection.id = self.store.insert(&protection).await?;

        self.cache
            .write()
            .await
            .insert(protection.coordinate.clone(), protection.clone());
        debug!(coordinate = %protection.coordinate, id = %protection.id, "protection created");

        Ok(protection)
    }

    /// Remove the protection at `coordinate`: backend delete first, cache
    /// eviction second.
    pub async fn remove(&self, coordinate: &Coordinate) -> StoreResult<()> {
        let _guard = self.mutation.lock().await;

        if !self.store.delete(coordinate).await? {
            return Err(StoreError::NotFound(coordinate.clone()));
        }

        self.cache.write().await.remove(coordinate);
        self.dirty_access.lock().await.remove(coordinate);
        debug!(coordinate = %coordinate, "protection removed");

        Ok(())
    }

    /// Persist a mutated protection and refresh the cache entry.
    pub async fn commit(&self, protection: Protection) -> StoreResult<Protection> {
        let _guard = self.mutation.lock().await;

        self.store.update(&protection).await?;
        self.cache
            .write()
            .await
            .insert(protection.coordinate.clone(), protection.clone());

        Ok(protection)
    }

    /// Bump `accessed` in the cache. Persistence is deferred; the field is
    /// advisory, so the write is batched into [`flush_access`](Self::flush_access).
    pub async fn touch_access(&self, coordinate: &Coordinate, now: i64) {
        let mut cache = self.cache.write().await;
        if let Some(protection) = cache.get_mut(coordinate) {
            protection.touch_access(now);
            self.dirty_access.lock().await.insert(coordinate.clone());
        }
    }

    /// Persist deferred `accessed` bumps. Failures are logged and skipped;
    /// the backend stays authoritative for everything that matters.
    pub async fn flush_access(&self) {
        let dirty: Vec<Coordinate> = self.dirty_access.lock().await.drain().collect();

        for coordinate in dirty {
            let snapshot = self.cache.read().await.get(&coordinate).cloned();
            if let Some(protection) = snapshot {
                if let Err(e) = self.store.update(&protection).await {
                    warn!(coordinate = %coordinate, error = %e, "deferred access-time flush failed");
                }
            }
        }
    }

    /// Drop cache entries for a world the host reported as unloaded.
    ///
    /// Pending access bumps for that world are flushed first; after that the
    /// backend remains authoritative and nothing is lost.
    pub async fn evict_world(&self, world: &str) {
        self.flush_access().await;

        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|coordinate, _| coordinate.world != world);
        debug!(world, evicted = before - cache.len(), "world cache evicted");
    }

    /// Warm the cache from the backend. Used at startup.
    pub async fn warm(&self) -> StoreResult<usize> {
        let all = self.store.load_all().await?;
        let count = all.len();

        let mut cache = self.cache.write().await;
        for protection in all {
            cache.insert(protection.coordinate.clone(), protection);
        }

        Ok(count)
    }

    /// Number of cached protections.
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }
}

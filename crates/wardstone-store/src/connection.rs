//! Connection lifecycle for the single storage backend.
//!
//! A [`ConnectionManager`] owns the one backend connection: it resolves the
//! configured driver, connects once at startup, and disconnects once at
//! shutdown. Nothing else constructs or tears down a backend.
//!
//! On a failed connect (unsupported driver name or backend error) the
//! manager enters the `Unavailable` state instead of propagating a crash:
//! every store operation then deterministically returns
//! [`StoreError::Unavailable`] until the process is restarted with corrected
//! configuration. Failing closed is deliberate; a store that silently
//! enforced nothing would be the worse failure.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use wardstone_core::{Coordinate, Protection, ProtectionId};

use crate::descriptor::{Driver, StorageDescriptor};
use crate::error::{Result, StoreError};
use crate::memory::MemoryBackend;
use crate::sqlite::SqliteBackend;
use crate::traits::ProtectionStore;

/// Connection health as reported to the startup/shutdown lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    /// `connect` has not been called yet, or `disconnect` already was.
    Disconnected,
    /// Connected through the given driver.
    Connected(Driver),
    /// Connect failed; degraded mode until restart.
    Unavailable,
}

enum State {
    Disconnected,
    Connected {
        driver: Driver,
        backend: Box<dyn ProtectionStore>,
    },
    Unavailable,
}

/// Owns the lifecycle of the single storage connection.
///
/// Implements [`ProtectionStore`] by delegating to the connected backend, so
/// callers hold one handle for both lifecycle and I/O.
pub struct ConnectionManager {
    state: RwLock<State>,
}

impl ConnectionManager {
    /// A manager with no connection yet.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::Disconnected),
        }
    }

    /// Resolve the descriptor and connect. Called once after configuration
    /// load; idempotent if already connected.
    ///
    /// On failure the manager is left `Unavailable` and the error is
    /// returned for reporting. No partial backend state survives a failed
    /// attempt.
    pub async fn connect(&self, descriptor: &StorageDescriptor) -> Result<()> {
        let mut state = self.state.write().await;

        if matches!(*state, State::Connected { .. }) {
            return Ok(());
        }

        match open_backend(descriptor) {
            Ok((driver, backend)) => {
                info!(driver = %driver, "connected to the protection database");
                *state = State::Connected { driver, backend };
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to connect to the protection database");
                *state = State::Unavailable;
                Err(e)
            }
        }
    }

    /// Release the connection. Safe to call when already disconnected; all
    /// further operations return [`StoreError::Unavailable`].
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, State::Connected { .. }) {
            info!("disconnected from the protection database");
        }
        *state = State::Disconnected;
    }

    /// Report connection health.
    pub async fn health(&self) -> ConnectionHealth {
        match &*self.state.read().await {
            State::Disconnected => ConnectionHealth::Disconnected,
            State::Connected { driver, .. } => ConnectionHealth::Connected(*driver),
            State::Unavailable => ConnectionHealth::Unavailable,
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn open_backend(descriptor: &StorageDescriptor) -> Result<(Driver, Box<dyn ProtectionStore>)> {
    let driver = descriptor.resolve_driver()?;
    let backend: Box<dyn ProtectionStore> = match driver {
        Driver::Memory => Box::new(MemoryBackend::new()),
        Driver::Sqlite => {
            if descriptor.path.is_empty() {
                return Err(StoreError::Connection(
                    "sqlite driver requires a database path".to_string(),
                ));
            }
            Box::new(
                SqliteBackend::open(&descriptor.path, &descriptor.prefix)
                    .map_err(|e| StoreError::Connection(e.to_string()))?,
            )
        }
    };
    Ok((driver, backend))
}

#[async_trait]
impl ProtectionStore for ConnectionManager {
    async fn insert(&self, protection: &Protection) -> Result<ProtectionId> {
        match &*self.state.read().await {
            State::Connected { backend, .. } => backend.insert(protection).await,
            _ => Err(StoreError::Unavailable),
        }
    }

    async fn update(&self, protection: &Protection) -> Result<()> {
        match &*self.state.read().await {
            State::Connected { backend, .. } => backend.update(protection).await,
            _ => Err(StoreError::Unavailable),
        }
    }

    async fn delete(&self, coordinate: &Coordinate) -> Result<bool> {
        match &*self.state.read().await {
            State::Connected { backend, .. } => backend.delete(coordinate).await,
            _ => Err(StoreError::Unavailable),
        }
    }

    async fn load(&self, coordinate: &Coordinate) -> Result<Option<Protection>> {
        match &*self.state.read().await {
            State::Connected { backend, .. } => backend.load(coordinate).await,
            _ => Err(StoreError::Unavailable),
        }
    }

    async fn load_all(&self) -> Result<Vec<Protection>> {
        match &*self.state.read().await {
            State::Connected { backend, .. } => backend.load_all().await,
            _ => Err(StoreError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn connect_memory_and_use() {
        let manager = ConnectionManager::new();
        manager
            .connect(&StorageDescriptor::memory())
            .await
            .unwrap();
        assert_eq!(
            manager.health().await,
            ConnectionHealth::Connected(Driver::Memory)
        );

        let p = Protection::new(Uuid::new_v4(), Coordinate::new("w", 1, 2, 3), 1000);
        manager.insert(&p).await.unwrap();
        assert!(manager.load(&p.coordinate).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unsupported_driver_degrades() {
        let manager = ConnectionManager::new();
        let descriptor = StorageDescriptor {
            driver: "oracle".to_string(),
            ..Default::default()
        };

        let err = manager.connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedDriver(_)));
        assert_eq!(manager.health().await, ConnectionHealth::Unavailable);

        let p = Protection::new(Uuid::new_v4(), Coordinate::new("w", 1, 2, 3), 1000);
        assert!(matches!(
            manager.insert(&p).await.unwrap_err(),
            StoreError::Unavailable
        ));
        assert!(matches!(
            manager.load(&p.coordinate).await.unwrap_err(),
            StoreError::Unavailable
        ));
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let manager = ConnectionManager::new();
        let descriptor = StorageDescriptor::memory();
        manager.connect(&descriptor).await.unwrap();

        let p = Protection::new(Uuid::new_v4(), Coordinate::new("w", 1, 2, 3), 1000);
        manager.insert(&p).await.unwrap();

        // A second connect keeps the existing backend and its data.
        manager.connect(&descriptor).await.unwrap();
        assert!(manager.load(&p.coordinate).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn disconnect_invalidates_operations() {
        let manager = ConnectionManager::new();
        manager
            .connect(&StorageDescriptor::memory())
            .await
            .unwrap();
        manager.disconnect().await;
        manager.disconnect().await; // safe to repeat

        assert_eq!(manager.health().await, ConnectionHealth::Disconnected);
        assert!(matches!(
            manager.load_all().await.unwrap_err(),
            StoreError::Unavailable
        ));
    }

    #[tokio::test]
    async fn sqlite_requires_a_path() {
        let manager = ConnectionManager::new();
        let descriptor = StorageDescriptor {
            driver: "sqlite".to_string(),
            ..Default::default()
        };
        let err = manager.connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
        assert_eq!(manager.health().await, ConnectionHealth::Unavailable);
    }
}

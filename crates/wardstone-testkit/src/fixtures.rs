//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use uuid::Uuid;

use wardstone::{DefaultHostAdapter, HostAdapter, ProtectionService};
use wardstone_core::{Actor, Coordinate, Protection, ProtectionRole};
use wardstone_store::{ConnectionManager, StorageDescriptor};

/// A test fixture with a started protection service and a roster of actors.
pub struct TestFixture {
    pub service: ProtectionService,
}

impl TestFixture {
    /// A fixture backed by the transient memory driver.
    pub async fn memory() -> Self {
        Self::with_descriptor(&StorageDescriptor::memory(), Arc::new(DefaultHostAdapter)).await
    }

    /// A fixture backed by SQLite at the given path.
    pub async fn sqlite(path: &str) -> Self {
        Self::with_descriptor(&StorageDescriptor::sqlite(path), Arc::new(DefaultHostAdapter))
            .await
    }

    /// A fixture with an explicit descriptor and host adapter.
    pub async fn with_descriptor(
        descriptor: &StorageDescriptor,
        host: Arc<dyn HostAdapter>,
    ) -> Self {
        let service = ProtectionService::new(Arc::new(ConnectionManager::new()), host);
        service
            .start(descriptor)
            .await
            .expect("fixture backend must connect");
        Self { service }
    }

    /// Create a chest protection owned by `owner` at `coordinate`.
    pub async fn protect(&self, owner: Uuid, coordinate: Coordinate) -> Protection {
        self.service
            .create_protection(owner, coordinate, "chest")
            .await
            .expect("fixture create must succeed")
    }

    /// Grant a role, acting as the owner.
    pub async fn grant(&self, owner: Uuid, coordinate: &Coordinate, role: ProtectionRole) {
        self.service
            .add_role(coordinate, &Actor::new(owner), role)
            .await
            .expect("fixture grant must succeed");
    }
}

/// A deterministic player UUID for test `i`.
pub fn player(i: u8) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[15] = i;
    Uuid::from_bytes(bytes)
}

/// A coordinate in the fixture overworld.
pub fn coordinate(x: i64, y: i64, z: i64) -> Coordinate {
    Coordinate::new("world", x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardstone_core::AccessLevel;

    #[tokio::test]
    async fn fixture_protects_and_resolves() {
        let fixture = TestFixture::memory().await;
        let owner = player(1);
        let spot = coordinate(10, 64, 10);

        fixture.protect(owner, spot.clone()).await;
        fixture.grant(owner, &spot, ProtectionRole::member(player(2))).await;

        let access = fixture
            .service
            .query_access(&spot, &Actor::new(player(2)))
            .await
            .unwrap();
        assert_eq!(access, Some(AccessLevel::Member));
    }

    #[test]
    fn players_are_deterministic_and_distinct() {
        assert_eq!(player(3), player(3));
        assert_ne!(player(3), player(4));
    }
}

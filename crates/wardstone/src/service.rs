//! The protection service: the façade external collaborators call.
//!
//! Composes the location index with access resolution, enforces the
//! protection invariants and the error taxonomy, and hosts the single
//! dispatch point for resource-interaction events. Constructed explicitly at
//! startup and passed where needed; there is no process-wide instance.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use wardstone_core::{
    is_owner, resolve, resolve_signal, AccessLevel, Actor, Coordinate, Protection, ProtectionRole,
    RoleSource,
};
use wardstone_store::{ConnectionManager, StorageDescriptor};

use crate::cache::LocationIndex;
use crate::error::{Result, ServiceError};
use crate::interact::{AppliedAction, InteractionOutcome, InteractionTracker, PendingAction};

/// The host collaborator: the one question the core asks the game layer.
pub trait HostAdapter: Send + Sync {
    /// Whether the resource of `kind` at `coordinate` may be protected.
    fn is_protectable(&self, coordinate: &Coordinate, kind: &str) -> bool;
}

/// Host adapter that allows protecting everything. The default until the
/// integration layer supplies a real one.
pub struct DefaultHostAdapter;

impl HostAdapter for DefaultHostAdapter {
    fn is_protectable(&self, _coordinate: &Coordinate, _kind: &str) -> bool {
        true
    }
}

/// A read-only description of a protection, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionInfo {
    pub coordinate: Coordinate,
    pub owner: Uuid,
    pub created: i64,
    pub updated: i64,
    pub accessed: i64,
    pub role_count: usize,
    /// Roles grouped by usable access level, highest level first. Levels
    /// with no roles are omitted.
    pub roles: Vec<(AccessLevel, Vec<RoleSource>)>,
}

impl ProtectionInfo {
    fn from_protection(protection: &Protection) -> Self {
        let mut roles = Vec::new();
        for level in AccessLevel::USABLE {
            let sources: Vec<RoleSource> = protection
                .roles_at(level)
                .map(|r| r.source.clone())
                .collect();
            if !sources.is_empty() {
                roles.push((level, sources));
            }
        }

        Self {
            coordinate: protection.coordinate.clone(),
            owner: protection.owner,
            created: protection.created,
            updated: protection.updated,
            accessed: protection.accessed,
            role_count: protection.roles().len(),
            roles,
        }
    }
}

/// The protection access-control store façade.
pub struct ProtectionService {
    connection: Arc<ConnectionManager>,
    index: LocationIndex,
    host: Arc<dyn HostAdapter>,
    interactions: InteractionTracker,
}

impl ProtectionService {
    /// Build the service on an already-constructed connection manager.
    pub fn new(connection: Arc<ConnectionManager>, host: Arc<dyn HostAdapter>) -> Self {
        Self {
            index: LocationIndex::new(connection.clone()),
            connection,
            host,
            interactions: InteractionTracker::default(),
        }
    }

    /// Connect the backend and warm the cache. Called once at startup.
    ///
    /// A connect failure is returned for reporting but leaves the service
    /// operational in degraded mode: every subsequent operation returns a
    /// storage error until a corrected restart.
    pub async fn start(&self, descriptor: &StorageDescriptor) -> Result<()> {
        self.connection.connect(descriptor).await?;
        let warmed = self.index.warm().await?;
        info!(protections = warmed, "protection store started");
        Ok(())
    }

    /// Flush deferred writes and release the backend. Called once at
    /// shutdown; no store operation is valid afterwards.
    pub async fn stop(&self) {
        self.index.flush_access().await;
        self.connection.disconnect().await;
    }

    /// The connection manager, for lifecycle introspection.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Whether the host allows protecting this resource.
    pub fn is_protectable(&self, coordinate: &Coordinate, kind: &str) -> bool {
        self.host.is_protectable(coordinate, kind)
    }

    /// Create a protection at `coordinate` owned by `owner`.
    pub async fn create_protection(
        &self,
        owner: Uuid,
        coordinate: Coordinate,
        kind: &str,
    ) -> Result<Protection> {
        if !self.host.is_protectable(&coordinate, kind) {
            return Err(ServiceError::Validation(format!(
                "resource \"{kind}\" at {coordinate} is not protectable"
            )));
        }

        Ok(self.index.create(owner, coordinate, now_secs()).await?)
    }

    /// Remove the protection at `coordinate`. Owner access required.
    pub async fn remove_protection(&self, coordinate: &Coordinate, requester: &Actor) -> Result<()> {
        let protection = self.require(coordinate).await?;
        self.require_owner(&protection, requester)?;
        Ok(self.index.remove(coordinate).await?)
    }

    /// Resolve `actor`'s effective access at `coordinate`.
    ///
    /// `None` means the coordinate is unprotected. A successful query on a
    /// protection bumps its `accessed` time.
    pub async fn query_access(
        &self,
        coordinate: &Coordinate,
        actor: &Actor,
    ) -> Result<Option<AccessLevel>> {
        match self.index.lookup(coordinate).await? {
            Some(protection) => {
                let access = resolve(&protection, actor);
                self.index.touch_access(coordinate, now_secs()).await;
                Ok(Some(access))
            }
            None => Ok(None),
        }
    }

    /// Resolve world-signal (redstone) access at `coordinate`. Only the
    /// signal path calls this; player queries never match redstone roles.
    pub async fn query_signal_access(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<AccessLevel>> {
        Ok(self
            .index
            .lookup(coordinate)
            .await?
            .map(|p| resolve_signal(&p)))
    }

    /// Describe the protection at `coordinate`.
    pub async fn describe(&self, coordinate: &Coordinate) -> Result<ProtectionInfo> {
        let protection = self.require(coordinate).await?;
        Ok(ProtectionInfo::from_protection(&protection))
    }

    /// Grant a role on the protection at `coordinate`. Owner access
    /// required; role-list invariants are enforced by the model.
    pub async fn add_role(
        &self,
        coordinate: &Coordinate,
        requester: &Actor,
        role: ProtectionRole,
    ) -> Result<Protection> {
        let mut protection = self.require(coordinate).await?;
        self.require_owner(&protection, requester)?;

        protection.add_role(role, now_secs())?;
        Ok(self.index.commit(protection).await?)
    }

    /// Revoke the role with `source` on the protection at `coordinate`.
    /// Owner access required.
    pub async fn remove_role(
        &self,
        coordinate: &Coordinate,
        requester: &Actor,
        source: &RoleSource,
    ) -> Result<Protection> {
        let mut protection = self.require(coordinate).await?;
        self.require_owner(&protection, requester)?;

        protection.remove_role(source, now_secs())?;
        Ok(self.index.commit(protection).await?)
    }

    /// Drop cached protections for an unloaded world.
    pub async fn evict_world(&self, world: &str) {
        self.index.evict_world(world).await;
    }

    /// Persist deferred access-time bumps.
    pub async fn flush_access(&self) {
        self.index.flush_access().await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Interaction state machine
    // ─────────────────────────────────────────────────────────────────────

    /// Begin awaiting a target click for `actor`. A stale pending request
    /// for the same actor is discarded.
    pub fn begin_interaction(&self, actor: Uuid, action: PendingAction) -> Option<PendingAction> {
        self.interactions.begin(actor, action, now_secs())
    }

    /// Cancel `actor`'s pending request, on disconnect. No mutation.
    pub fn cancel_interaction(&self, actor: Uuid) -> bool {
        self.interactions.cancel(actor)
    }

    /// Whether `actor` is awaiting a target.
    pub fn has_pending_interaction(&self, actor: Uuid) -> bool {
        self.interactions.is_pending(actor)
    }

    /// The single dispatch point for "resource interacted" notifications.
    ///
    /// Completes the actor's pending action against the clicked target, or,
    /// with nothing pending, returns the plain access decision the host uses
    /// to allow or deny the interaction.
    pub async fn handle_interaction(
        &self,
        actor: &Actor,
        coordinate: Coordinate,
        kind: &str,
    ) -> Result<InteractionOutcome> {
        let Some(action) = self.interactions.take(actor.id) else {
            let access = self.query_access(&coordinate, actor).await?;
            return Ok(InteractionOutcome::Decision(access));
        };

        match action {
            PendingAction::Create => {
                if !self.host.is_protectable(&coordinate, kind) {
                    return Ok(InteractionOutcome::Cancelled);
                }
                let protection = self.create_protection(actor.id, coordinate, kind).await?;
                Ok(InteractionOutcome::Applied(AppliedAction::Created(
                    protection,
                )))
            }
            PendingAction::Remove => {
                if self.index.lookup(&coordinate).await?.is_none() {
                    return Ok(InteractionOutcome::Cancelled);
                }
                self.remove_protection(&coordinate, actor).await?;
                Ok(InteractionOutcome::Applied(AppliedAction::Removed(
                    coordinate,
                )))
            }
            PendingAction::Info => {
                if self.index.lookup(&coordinate).await?.is_none() {
                    return Ok(InteractionOutcome::Cancelled);
                }
                let info = self.describe(&coordinate).await?;
                Ok(InteractionOutcome::Applied(AppliedAction::Described(info)))
            }
            PendingAction::AddRole(role) => {
                if self.index.lookup(&coordinate).await?.is_none() {
                    return Ok(InteractionOutcome::Cancelled);
                }
                let protection = self.add_role(&coordinate, actor, role).await?;
                Ok(InteractionOutcome::Applied(AppliedAction::RoleAdded(
                    protection,
                )))
            }
            PendingAction::RemoveRole(source) => {
                if self.index.lookup(&coordinate).await?.is_none() {
                    return Ok(InteractionOutcome::Cancelled);
                }
                let protection = self.remove_role(&coordinate, actor, &source).await?;
                Ok(InteractionOutcome::Applied(AppliedAction::RoleRemoved(
                    protection,
                )))
            }
        }
    }

    async fn require(&self, coordinate: &Coordinate) -> Result<Protection> {
        self.index
            .lookup(coordinate)
            .await?
            .ok_or_else(|| ServiceError::NotFound(coordinate.clone()))
    }

    fn require_owner(&self, protection: &Protection, requester: &Actor) -> Result<()> {
        if is_owner(protection, requester) {
            Ok(())
        } else {
            Err(ServiceError::Permission {
                required: AccessLevel::Owner,
                actual: resolve(protection, requester),
            })
        }
    }
}

/// Get current time in epoch seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

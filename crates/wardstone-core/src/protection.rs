//! The protection record and its role list.
//!
//! A [`Protection`] is the access-control record attached to one coordinate.
//! Its role list carries exactly one owner-level role, and role sources
//! (the (type, target) pair) are unique within the list. Both invariants are
//! enforced here at mutation time rather than trusted from callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::access::AccessLevel;
use crate::error::RoleError;
use crate::password::PasswordHash;
use crate::types::{Coordinate, ProtectionId};

/// The discriminated (type, target) pair identifying one role grant.
///
/// Source equality is the uniqueness key for a protection's role list: a
/// protection holds at most one role per source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleSource {
    /// A specific player, by UUID. The owner role is a player source at
    /// owner access.
    Player(Uuid),
    /// Every member of a named group.
    Group(String),
    /// Anyone presenting a credential matching the stored hash.
    Password(PasswordHash),
    /// Everyone, credential-free. The public-guest tier.
    Everyone,
    /// World signal (redstone) interaction. Never matched for player actors.
    Redstone,
    /// An extension-defined role kind with an opaque target.
    Custom { kind: String, target: String },
}

impl fmt::Display for RoleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleSource::Player(id) => write!(f, "player:{id}"),
            RoleSource::Group(name) => write!(f, "group:{name}"),
            RoleSource::Password(hash) => write!(f, "password:{hash}"),
            RoleSource::Everyone => write!(f, "everyone"),
            RoleSource::Redstone => write!(f, "redstone"),
            RoleSource::Custom { kind, target } => write!(f, "{kind}:{target}"),
        }
    }
}

/// One access grant within a protection: a source and the level it confers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionRole {
    pub access: AccessLevel,
    pub source: RoleSource,
}

impl ProtectionRole {
    pub fn new(access: AccessLevel, source: RoleSource) -> Self {
        Self { access, source }
    }

    /// A member grant for a specific player.
    pub fn member(player: Uuid) -> Self {
        Self::new(AccessLevel::Member, RoleSource::Player(player))
    }

    /// A member grant for a named group.
    pub fn group(name: impl Into<String>, access: AccessLevel) -> Self {
        Self::new(access, RoleSource::Group(name.into()))
    }

    /// A guest grant for everyone.
    pub fn public_guest() -> Self {
        Self::new(AccessLevel::Guest, RoleSource::Everyone)
    }

    /// A member grant unlocked by a credential.
    pub fn password(credential: &str) -> Self {
        Self::new(
            AccessLevel::Member,
            RoleSource::Password(PasswordHash::from_credential(credential)),
        )
    }
}

/// The access-control record attached to one [`Coordinate`].
///
/// Timestamps are epoch seconds and monotonically non-decreasing over the
/// protection's life. The role list is ordered (insertion order) and owned
/// exclusively by the location index; see the store crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    /// Backend-assigned identifier; `UNASSIGNED` until first insert.
    pub id: ProtectionId,
    pub coordinate: Coordinate,
    /// The owning player. Mirrored by the mandatory owner role.
    pub owner: Uuid,
    /// Creation time, epoch seconds.
    pub created: i64,
    /// Last role mutation, epoch seconds. Never before `created`.
    pub updated: i64,
    /// Last successful access query, epoch seconds. Never before `created`.
    pub accessed: i64,
    roles: Vec<ProtectionRole>,
}

impl Protection {
    /// Create a new protection owned by `owner`, with the mandatory
    /// owner role as the sole entry in the role list.
    pub fn new(owner: Uuid, coordinate: Coordinate, now: i64) -> Self {
        Self {
            id: ProtectionId::UNASSIGNED,
            coordinate,
            owner,
            created: now,
            updated: now,
            accessed: now,
            roles: vec![ProtectionRole::new(
                AccessLevel::Owner,
                RoleSource::Player(owner),
            )],
        }
    }

    /// Rebuild a protection from persisted fields. Used by storage backends;
    /// the role list is trusted to already satisfy the invariants it was
    /// written under.
    pub fn from_parts(
        id: ProtectionId,
        coordinate: Coordinate,
        owner: Uuid,
        created: i64,
        updated: i64,
        accessed: i64,
        roles: Vec<ProtectionRole>,
    ) -> Self {
        Self {
            id,
            coordinate,
            owner,
            created,
            updated,
            accessed,
            roles,
        }
    }

    /// The ordered role list.
    pub fn roles(&self) -> &[ProtectionRole] {
        &self.roles
    }

    /// The mandatory owner role.
    pub fn owner_role(&self) -> &ProtectionRole {
        self.roles
            .iter()
            .find(|r| r.access == AccessLevel::Owner)
            .expect("protection invariant: owner role always present")
    }

    /// Find the role with the given source, if any.
    pub fn role(&self, source: &RoleSource) -> Option<&ProtectionRole> {
        self.roles.iter().find(|r| &r.source == source)
    }

    /// All roles at a given access level, in list order.
    pub fn roles_at(&self, access: AccessLevel) -> impl Iterator<Item = &ProtectionRole> {
        self.roles.iter().filter(move |r| r.access == access)
    }

    /// Add a role, bumping `updated`.
    ///
    /// Rejects a duplicate source and a second owner-level role.
    pub fn add_role(&mut self, role: ProtectionRole, now: i64) -> Result<(), RoleError> {
        if self.role(&role.source).is_some() {
            return Err(RoleError::DuplicateRole(role.source));
        }
        if role.access == AccessLevel::Owner {
            return Err(RoleError::SecondOwner);
        }
        self.roles.push(role);
        self.touch_update(now);
        Ok(())
    }

    /// Remove the role with the given source, bumping `updated`.
    ///
    /// The owner role is immutable; removing the protection is the only way
    /// to retire it.
    pub fn remove_role(
        &mut self,
        source: &RoleSource,
        now: i64,
    ) -> Result<ProtectionRole, RoleError> {
        let index = self
            .roles
            .iter()
            .position(|r| &r.source == source)
            .ok_or_else(|| RoleError::RoleNotFound(source.clone()))?;
        if self.roles[index].access == AccessLevel::Owner {
            return Err(RoleError::OwnerRoleImmutable);
        }
        let removed = self.roles.remove(index);
        self.touch_update(now);
        Ok(removed)
    }

    /// Record a successful access query. Clamped monotonic.
    pub fn touch_access(&mut self, now: i64) {
        self.accessed = self.accessed.max(now);
    }

    fn touch_update(&mut self, now: i64) {
        self.updated = self.updated.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protection() -> Protection {
        Protection::new(Uuid::new_v4(), Coordinate::new("w", 10, 64, 10), 1000)
    }

    #[test]
    fn new_protection_has_exactly_one_owner_role() {
        let p = protection();
        assert_eq!(p.roles().len(), 1);
        assert_eq!(p.owner_role().access, AccessLevel::Owner);
        assert_eq!(p.owner_role().source, RoleSource::Player(p.owner));
    }

    #[test]
    fn add_role_rejects_duplicate_source() {
        let mut p = protection();
        let member = Uuid::new_v4();
        p.add_role(ProtectionRole::member(member), 1001).unwrap();
        assert_eq!(
            p.add_role(ProtectionRole::member(member), 1002),
            Err(RoleError::DuplicateRole(RoleSource::Player(member)))
        );
    }

    #[test]
    fn add_role_rejects_second_owner() {
        let mut p = protection();
        let other = Uuid::new_v4();
        let result = p.add_role(
            ProtectionRole::new(AccessLevel::Owner, RoleSource::Player(other)),
            1001,
        );
        assert_eq!(result, Err(RoleError::SecondOwner));
    }

    #[test]
    fn remove_role_refuses_owner_role() {
        let mut p = protection();
        let owner_source = RoleSource::Player(p.owner);
        assert_eq!(
            p.remove_role(&owner_source, 1001),
            Err(RoleError::OwnerRoleImmutable)
        );
        assert_eq!(p.roles().len(), 1);
    }

    #[test]
    fn remove_missing_role_reports_not_found() {
        let mut p = protection();
        let result = p.remove_role(&RoleSource::Everyone, 1001);
        assert_eq!(result, Err(RoleError::RoleNotFound(RoleSource::Everyone)));
    }

    #[test]
    fn role_mutation_bumps_updated_monotonically() {
        let mut p = protection();
        p.add_role(ProtectionRole::public_guest(), 2000).unwrap();
        assert_eq!(p.updated, 2000);

        // A stale clock never moves timestamps backwards.
        p.remove_role(&RoleSource::Everyone, 500).unwrap();
        assert_eq!(p.updated, 2000);
        assert_eq!(p.created, 1000);
    }

    #[test]
    fn touch_access_is_monotonic() {
        let mut p = protection();
        p.touch_access(3000);
        assert_eq!(p.accessed, 3000);
        p.touch_access(2500);
        assert_eq!(p.accessed, 3000);
    }
}

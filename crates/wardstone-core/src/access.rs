//! Access resolution: computing an actor's effective access level.
//!
//! Resolution is total and side-effect-free. Tiers are evaluated in a fixed
//! precedence order and the first tier with a match decides; within a tier
//! the highest access level wins:
//!
//! 1. exact player identity
//! 2. group membership
//! 3. password credential
//! 4. (redstone — world-signal path only, skipped for player actors)
//! 5. public guest
//! 6. no match: [`AccessLevel::None`]

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::protection::{Protection, RoleSource};

/// An ordered access grant tier.
///
/// The derived `Ord` follows declaration order: `None < Guest < Member <
/// Owner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum AccessLevel {
    #[default]
    None,
    Guest,
    Member,
    Owner,
}

impl AccessLevel {
    /// The levels worth enumerating for display, highest first. `None` is
    /// omitted; a none-level role is an explicit deny, not a grant.
    pub const USABLE: [AccessLevel; 3] = [AccessLevel::Owner, AccessLevel::Member, AccessLevel::Guest];

    /// Whether this level satisfies a `required` threshold.
    pub fn grants(&self, required: AccessLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::None => "none",
            AccessLevel::Guest => "guest",
            AccessLevel::Member => "member",
            AccessLevel::Owner => "owner",
        };
        write!(f, "{name}")
    }
}

/// An identified caller querying or mutating a protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The player identity.
    pub id: Uuid,
    /// Groups this actor belongs to, per the host permission layer.
    pub groups: Vec<String>,
    /// A credential supplied for password roles, if any.
    pub credential: Option<String>,
}

impl Actor {
    /// An actor with no group memberships and no credential.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            groups: Vec::new(),
            credential: None,
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

/// Compute `actor`'s effective access level on `protection`.
pub fn resolve(protection: &Protection, actor: &Actor) -> AccessLevel {
    // Tier 1: exact player identity.
    let identity = protection
        .roles()
        .iter()
        .filter(|r| matches!(&r.source, RoleSource::Player(id) if *id == actor.id))
        .map(|r| r.access)
        .max();
    if let Some(access) = identity {
        return access;
    }

    // Tier 2: group membership.
    let group = protection
        .roles()
        .iter()
        .filter(
            |r| matches!(&r.source, RoleSource::Group(name) if actor.groups.iter().any(|g| g == name)),
        )
        .map(|r| r.access)
        .max();
    if let Some(access) = group {
        return access;
    }

    // Tier 3: password credential. A matching credential confers the role's
    // level; a password role with no matching credential decides None.
    let password_roles: Vec<_> = protection
        .roles()
        .iter()
        .filter_map(|r| match &r.source {
            RoleSource::Password(hash) => Some((r.access, hash)),
            _ => None,
        })
        .collect();
    if !password_roles.is_empty() {
        if let Some(credential) = &actor.credential {
            let matched = password_roles
                .iter()
                .filter(|(_, hash)| hash.matches(credential))
                .map(|(access, _)| *access)
                .max();
            if let Some(access) = matched {
                return access;
            }
        }
        return AccessLevel::None;
    }

    // Tier 4: redstone roles are never matched for player actors.

    // Tier 5: public guest.
    if let Some(access) = protection
        .roles()
        .iter()
        .filter(|r| r.source == RoleSource::Everyone)
        .map(|r| r.access)
        .max()
    {
        return access;
    }

    AccessLevel::None
}

/// Access level conferred on a world-signal (redstone) interaction.
///
/// This is the only path that evaluates redstone roles; player resolution
/// skips them.
pub fn resolve_signal(protection: &Protection) -> AccessLevel {
    protection
        .roles()
        .iter()
        .filter(|r| r.source == RoleSource::Redstone)
        .map(|r| r.access)
        .max()
        .unwrap_or(AccessLevel::None)
}

/// Whether `actor` resolves to owner access on `protection`.
pub fn is_owner(protection: &Protection, actor: &Actor) -> bool {
    resolve(protection, actor) == AccessLevel::Owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protection::ProtectionRole;
    use crate::types::Coordinate;

    fn protection(owner: Uuid) -> Protection {
        Protection::new(owner, Coordinate::new("w", 0, 0, 0), 1000)
    }

    #[test]
    fn precedence_owner_member_guest() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let u3 = Uuid::new_v4();

        let mut p = protection(u1);
        p.add_role(ProtectionRole::member(u2), 1001).unwrap();
        p.add_role(ProtectionRole::public_guest(), 1002).unwrap();

        assert_eq!(resolve(&p, &Actor::new(u1)), AccessLevel::Owner);
        assert_eq!(resolve(&p, &Actor::new(u2)), AccessLevel::Member);
        assert_eq!(resolve(&p, &Actor::new(u3)), AccessLevel::Guest);
    }

    #[test]
    fn identity_beats_group() {
        let owner = Uuid::new_v4();
        let u = Uuid::new_v4();

        let mut p = protection(owner);
        // Explicit per-player deny outranks a group grant.
        p.add_role(
            ProtectionRole::new(AccessLevel::None, RoleSource::Player(u)),
            1001,
        )
        .unwrap();
        p.add_role(ProtectionRole::group("vip", AccessLevel::Member), 1002)
            .unwrap();

        let actor = Actor::new(u).with_groups(["vip"]);
        assert_eq!(resolve(&p, &actor), AccessLevel::None);
    }

    #[test]
    fn group_membership_match() {
        let owner = Uuid::new_v4();
        let mut p = protection(owner);
        p.add_role(ProtectionRole::group("builders", AccessLevel::Member), 1001)
            .unwrap();

        let member = Actor::new(Uuid::new_v4()).with_groups(["builders"]);
        let stranger = Actor::new(Uuid::new_v4()).with_groups(["miners"]);

        assert_eq!(resolve(&p, &member), AccessLevel::Member);
        assert_eq!(resolve(&p, &stranger), AccessLevel::None);
    }

    #[test]
    fn highest_level_wins_within_a_tier() {
        let owner = Uuid::new_v4();
        let mut p = protection(owner);
        p.add_role(ProtectionRole::group("a", AccessLevel::Guest), 1001)
            .unwrap();
        p.add_role(ProtectionRole::group("b", AccessLevel::Member), 1002)
            .unwrap();

        let actor = Actor::new(Uuid::new_v4()).with_groups(["a", "b"]);
        assert_eq!(resolve(&p, &actor), AccessLevel::Member);
    }

    #[test]
    fn password_grants_member_on_match_and_none_otherwise() {
        let owner = Uuid::new_v4();
        let mut p = protection(owner);
        p.add_role(ProtectionRole::password("sesame"), 1001).unwrap();
        p.add_role(ProtectionRole::public_guest(), 1002).unwrap();

        let with_pass = Actor::new(Uuid::new_v4()).with_credential("sesame");
        let wrong_pass = Actor::new(Uuid::new_v4()).with_credential("open");
        let no_pass = Actor::new(Uuid::new_v4());

        assert_eq!(resolve(&p, &with_pass), AccessLevel::Member);
        // A present password tier decides: the guest tier is never reached.
        assert_eq!(resolve(&p, &wrong_pass), AccessLevel::None);
        assert_eq!(resolve(&p, &no_pass), AccessLevel::None);
    }

    #[test]
    fn redstone_skipped_for_players() {
        let owner = Uuid::new_v4();
        let mut p = protection(owner);
        p.add_role(
            ProtectionRole::new(AccessLevel::Member, RoleSource::Redstone),
            1001,
        )
        .unwrap();

        assert_eq!(resolve(&p, &Actor::new(Uuid::new_v4())), AccessLevel::None);
        assert_eq!(resolve_signal(&p), AccessLevel::Member);
    }

    #[test]
    fn signal_resolution_without_redstone_role_is_none() {
        let p = protection(Uuid::new_v4());
        assert_eq!(resolve_signal(&p), AccessLevel::None);
    }

    #[test]
    fn is_owner_matches_resolution() {
        let owner = Uuid::new_v4();
        let p = protection(owner);
        assert!(is_owner(&p, &Actor::new(owner)));
        assert!(!is_owner(&p, &Actor::new(Uuid::new_v4())));
    }

    #[test]
    fn level_ordering() {
        assert!(AccessLevel::None < AccessLevel::Guest);
        assert!(AccessLevel::Guest < AccessLevel::Member);
        assert!(AccessLevel::Member < AccessLevel::Owner);
        assert!(AccessLevel::Member.grants(AccessLevel::Guest));
        assert!(!AccessLevel::Guest.grants(AccessLevel::Member));
    }
}

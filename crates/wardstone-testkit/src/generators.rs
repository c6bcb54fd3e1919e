//! Proptest generators for property-based testing.

use proptest::prelude::*;
use uuid::Uuid;

use wardstone_core::{
    AccessLevel, Coordinate, PasswordHash, Protection, ProtectionRole, RoleSource,
};

/// Generate a deterministic player UUID from raw bytes.
pub fn player_id() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

/// Generate a world name.
pub fn world_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate a coordinate within plausible world bounds.
pub fn coordinate() -> impl Strategy<Value = Coordinate> {
    (
        world_name(),
        -30_000_000i64..=30_000_000,
        -64i64..=320,
        -30_000_000i64..=30_000_000,
    )
        .prop_map(|(world, x, y, z)| Coordinate::new(world, x, y, z))
}

/// Generate any access level, including the explicit-deny `None`.
pub fn access_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::None),
        Just(AccessLevel::Guest),
        Just(AccessLevel::Member),
        Just(AccessLevel::Owner),
    ]
}

/// Generate a grantable access level (everything below owner).
pub fn grantable_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::None),
        Just(AccessLevel::Guest),
        Just(AccessLevel::Member),
    ]
}

/// Generate a group name.
pub fn group_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}".prop_map(String::from)
}

/// Generate a role source.
pub fn role_source() -> impl Strategy<Value = RoleSource> {
    prop_oneof![
        player_id().prop_map(RoleSource::Player),
        group_name().prop_map(RoleSource::Group),
        "[a-z]{4,12}".prop_map(|s| RoleSource::Password(PasswordHash::from_credential(&s))),
        Just(RoleSource::Everyone),
        Just(RoleSource::Redstone),
    ]
}

/// Generate a non-owner role.
pub fn role() -> impl Strategy<Value = ProtectionRole> {
    (grantable_level(), role_source()).prop_map(|(access, source)| ProtectionRole::new(access, source))
}

/// Generate a reasonable epoch-seconds timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_000_000_000
}

/// Parameters for generating a protection.
#[derive(Debug, Clone)]
pub struct ProtectionParams {
    pub owner: Uuid,
    pub coordinate: Coordinate,
    pub created: i64,
    pub roles: Vec<ProtectionRole>,
}

impl Arbitrary for ProtectionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 16]>(),
            coordinate(),
            0i64..=2_000_000_000,
            prop::collection::vec(role(), 0..8),
        )
            .prop_map(|(owner, coordinate, created, roles)| ProtectionParams {
                owner: Uuid::from_bytes(owner),
                coordinate,
                created,
                roles,
            })
            .boxed()
    }
}

/// Build a protection from parameters.
///
/// Generated roles whose source collides with an existing one (including the
/// owner's player source) are skipped, so the result always satisfies the
/// role-list invariants.
pub fn protection_from_params(params: &ProtectionParams) -> Protection {
    let mut protection = Protection::new(params.owner, params.coordinate.clone(), params.created);
    for role in &params.roles {
        let _ = protection.add_role(role.clone(), params.created);
    }
    protection
}

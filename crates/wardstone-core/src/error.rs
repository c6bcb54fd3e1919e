//! Error types for the Wardstone core.

use thiserror::Error;

use crate::protection::RoleSource;

/// Errors raised by role-list mutation on a protection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    /// A role with the same (type, target) source already exists.
    #[error("duplicate role for {0}")]
    DuplicateRole(RoleSource),

    /// A protection carries exactly one owner-level role.
    #[error("protection already has an owner role")]
    SecondOwner,

    /// The owner role cannot be removed; remove the protection instead.
    #[error("the owner role cannot be removed")]
    OwnerRoleImmutable,

    /// No role with the given source exists on this protection.
    #[error("no role for {0}")]
    RoleNotFound(RoleSource),
}

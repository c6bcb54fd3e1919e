//! # Wardstone Core
//!
//! Pure data model for the Wardstone protection store: coordinates,
//! protections, roles, and access resolution.
//!
//! This crate contains no I/O, no storage, no host integration. It is pure
//! computation over access-control data.
//!
//! ## Key Types
//!
//! - [`Coordinate`] - World identifier plus integer position, addressing one
//!   protectable resource
//! - [`Protection`] - The access-control record attached to a coordinate
//! - [`ProtectionRole`] - One access grant within a protection
//! - [`AccessLevel`] - Ordered grant tier (`None < Guest < Member < Owner`)
//! - [`Actor`] - An identified caller: UUID, group memberships, optional
//!   supplied credential
//!
//! ## Access Resolution
//!
//! [`resolve`] computes an actor's effective access level from a protection's
//! role list. It is total and side-effect-free; see the [`access`] module for
//! the precedence order.

pub mod access;
pub mod error;
pub mod password;
pub mod protection;
pub mod types;

pub use access::{is_owner, resolve, resolve_signal, AccessLevel, Actor};
pub use error::RoleError;
pub use password::PasswordHash;
pub use protection::{Protection, ProtectionRole, RoleSource};
pub use types::{Coordinate, ProtectionId};

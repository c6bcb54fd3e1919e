//! Wardstone: a per-coordinate protection access-control store.
//!
//! This crate is the façade: it wires the pure access model from
//! [`wardstone_core`] to the persistence layer in [`wardstone_store`] and
//! exposes the [`ProtectionService`] that external collaborators call.
//!
//! The service owns a write-through location index in front of the storage
//! backend, enforces the protection invariants and permission gates, and
//! hosts the per-actor interaction state machine for "click a resource to
//! act on it" flows.

pub mod cache;
pub mod config;
pub mod error;
pub mod interact;
pub mod service;

pub use cache::LocationIndex;
pub use config::{Config, DatabaseConfig};
pub use error::{Result, ServiceError};
pub use interact::{AppliedAction, InteractionOutcome, PendingAction};
pub use service::{DefaultHostAdapter, HostAdapter, ProtectionInfo, ProtectionService};

pub use wardstone_core::{
    resolve, resolve_signal, AccessLevel, Actor, Coordinate, PasswordHash, Protection,
    ProtectionId, ProtectionRole, RoleError, RoleSource,
};
pub use wardstone_store::{
    ConnectionHealth, ConnectionManager, Driver, StorageDescriptor, StoreError,
};

//! # Wardstone Store
//!
//! Storage abstraction for the Wardstone protection store. Provides a
//! trait-based interface for protection persistence with SQLite and
//! in-memory implementations behind a connection-managed lifecycle.
//!
//! ## Overview
//!
//! Persistence is abstracted behind the [`ProtectionStore`] trait. The
//! durable implementation is [`SqliteBackend`]; [`MemoryBackend`] implements
//! the same contract with no durability and exists so the store can run with
//! zero external dependencies.
//!
//! A [`ConnectionManager`] owns the lifecycle of the single backend
//! connection: it resolves a [`StorageDescriptor`] to a [`Driver`], connects
//! once at startup, and degrades to an `Unavailable` state on failure where
//! every operation deterministically returns [`StoreError::Unavailable`].
//! Failing closed keeps protections enforced-by-absence rather than silently
//! unenforced.
//!
//! ## Key Types
//!
//! - [`ProtectionStore`] - The async trait for all storage operations
//! - [`SqliteBackend`] - SQLite-based persistent storage
//! - [`MemoryBackend`] - Transient in-process storage
//! - [`ConnectionManager`] - Connection lifecycle and degraded mode
//! - [`StorageDescriptor`] - Resolved-once backend configuration

pub mod connection;
pub mod descriptor;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use connection::{ConnectionHealth, ConnectionManager};
pub use descriptor::{Driver, StorageDescriptor};
pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::ProtectionStore;

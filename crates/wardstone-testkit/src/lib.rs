//! # Wardstone Testkit
//!
//! Testing utilities for Wardstone.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use wardstone_testkit::generators::{protection_from_params, ProtectionParams};
//!
//! proptest! {
//!     #[test]
//!     fn owner_is_always_owner(params: ProtectionParams) {
//!         let p = protection_from_params(&params);
//!         prop_assert_eq!(p.owner_role().source, wardstone_core::RoleSource::Player(params.owner));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,ignore
//! use wardstone_testkit::fixtures::{coordinate, player, TestFixture};
//!
//! let fixture = TestFixture::memory().await;
//! let protection = fixture.protect(player(1), coordinate(10, 64, 10)).await;
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{coordinate, player, TestFixture};
pub use generators::{protection_from_params, ProtectionParams};

//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system: each migration transforms the schema
//! from version N to N+1. The configured table prefix is applied to every
//! table name, including the migrations table itself.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent; safe to call on every connect.
pub fn migrate(conn: &mut Connection, prefix: &str) -> Result<()> {
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {prefix}schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )"
        ),
        [],
    )?;

    let current: u32 = conn
        .query_row(
            &format!("SELECT COALESCE(MAX(version), 0) FROM {prefix}schema_migrations"),
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, prefix, version)?;

            tx.execute(
                &format!(
                    "INSERT INTO {prefix}schema_migrations (version, applied_at) VALUES (?1, ?2)"
                ),
                rusqlite::params![version, now_secs()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, prefix: &str, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn, prefix),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection, prefix: &str) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        -- Protections: one row per protected coordinate
        CREATE TABLE {prefix}protections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            world TEXT NOT NULL,
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            z INTEGER NOT NULL,
            owner TEXT NOT NULL,              -- UUID, text form
            created INTEGER NOT NULL,         -- epoch seconds
            updated INTEGER NOT NULL,
            accessed INTEGER NOT NULL,

            UNIQUE(world, x, y, z)
        );

        -- Role list side table, ordered by position
        CREATE TABLE {prefix}protection_roles (
            protection_id INTEGER NOT NULL,
            position INTEGER NOT NULL,        -- list order within the protection
            access INTEGER NOT NULL,          -- AccessLevel as integer
            kind TEXT NOT NULL,               -- role source discriminant
            target TEXT NOT NULL,             -- role source target, "" when none

            PRIMARY KEY (protection_id, position),
            UNIQUE(protection_id, kind, target)
        );

        CREATE INDEX {prefix}idx_protections_world ON {prefix}protections(world);
        CREATE INDEX {prefix}idx_roles_protection ON {prefix}protection_roles(protection_id);
        "#
    ))?;

    Ok(())
}

/// Get current time in epoch seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

//! SQLite implementation of the ProtectionStore trait.
//!
//! The durable backend. Uses rusqlite with bundled SQLite, wrapped in async
//! via tokio::spawn_blocking. The protection row and its role rows are
//! always written in one transaction so a crash never leaves a protection
//! without its owner role.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use wardstone_core::{
    AccessLevel, Coordinate, PasswordHash, Protection, ProtectionId, ProtectionRole, RoleSource,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::ProtectionStore;

/// SQLite-based backend.
///
/// Thread-safe via an internal Mutex around the single connection. All
/// operations hop to `spawn_blocking` to keep the async runtime unblocked.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    prefix: Arc<str>,
}

impl SqliteBackend {
    /// Open a SQLite database at the given path with the given table prefix.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn, prefix)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            prefix: Arc::from(prefix),
        })
    }

    /// Open an in-memory SQLite database with no table prefix.
    ///
    /// Durable-backend semantics without a file; useful for tests.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn, "")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            prefix: Arc::from(""),
        })
    }
}

/// Lock the connection, mapping a poisoned mutex to a database error.
fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

/// Map a spawn_blocking join failure to a store error.
fn join_err(e: tokio::task::JoinError) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(format!("spawn_blocking failed: {}", e)),
    ))
}

/// Encode a role as (access, kind, target) columns.
fn role_to_columns(role: &ProtectionRole) -> (i64, String, String) {
    let access = access_to_int(role.access);
    match &role.source {
        RoleSource::Player(id) => (access, "player".into(), id.to_string()),
        RoleSource::Group(name) => (access, "group".into(), name.clone()),
        RoleSource::Password(hash) => (access, "password".into(), hash.to_hex()),
        RoleSource::Everyone => (access, "everyone".into(), String::new()),
        RoleSource::Redstone => (access, "redstone".into(), String::new()),
        RoleSource::Custom { kind, target } => (access, kind.clone(), target.clone()),
    }
}

/// Decode (access, kind, target) columns back to a role.
fn role_from_columns(access: i64, kind: &str, target: &str) -> Result<ProtectionRole> {
    let source = match kind {
        "player" => RoleSource::Player(
            Uuid::parse_str(target)
                .map_err(|e| StoreError::InvalidData(format!("bad player uuid: {}", e)))?,
        ),
        "group" => RoleSource::Group(target.to_string()),
        "password" => RoleSource::Password(
            PasswordHash::from_hex(target)
                .map_err(|e| StoreError::InvalidData(format!("bad password hash: {}", e)))?,
        ),
        "everyone" => RoleSource::Everyone,
        "redstone" => RoleSource::Redstone,
        custom => RoleSource::Custom {
            kind: custom.to_string(),
            target: target.to_string(),
        },
    };
    Ok(ProtectionRole::new(access_from_int(access)?, source))
}

fn access_to_int(access: AccessLevel) -> i64 {
    match access {
        AccessLevel::None => 0,
        AccessLevel::Guest => 1,
        AccessLevel::Member => 2,
        AccessLevel::Owner => 3,
    }
}

fn access_from_int(value: i64) -> Result<AccessLevel> {
    match value {
        0 => Ok(AccessLevel::None),
        1 => Ok(AccessLevel::Guest),
        2 => Ok(AccessLevel::Member),
        3 => Ok(AccessLevel::Owner),
        other => Err(StoreError::InvalidData(format!(
            "unknown access level: {}",
            other
        ))),
    }
}

/// Load the ordered role list for a protection id.
fn load_roles(conn: &Connection, prefix: &str, id: i64) -> Result<Vec<ProtectionRole>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT access, kind, target FROM {prefix}protection_roles
         WHERE protection_id = ?1 ORDER BY position"
    ))?;

    let rows = stmt.query_map(params![id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut roles = Vec::new();
    for row in rows {
        let (access, kind, target) = row?;
        roles.push(role_from_columns(access, &kind, &target)?);
    }
    Ok(roles)
}

/// Insert the role rows for a protection id inside an open transaction.
fn write_roles(
    tx: &rusqlite::Transaction<'_>,
    prefix: &str,
    id: i64,
    roles: &[ProtectionRole],
) -> Result<()> {
    for (position, role) in roles.iter().enumerate() {
        let (access, kind, target) = role_to_columns(role);
        tx.execute(
            &format!(
                "INSERT INTO {prefix}protection_roles
                 (protection_id, position, access, kind, target)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![id, position as i64, access, kind, target],
        )?;
    }
    Ok(())
}

/// Map a protection row plus its roles back to the model.
fn protection_from_row(
    id: i64,
    world: String,
    x: i64,
    y: i64,
    z: i64,
    owner: String,
    created: i64,
    updated: i64,
    accessed: i64,
    roles: Vec<ProtectionRole>,
) -> Result<Protection> {
    let owner = Uuid::parse_str(&owner)
        .map_err(|e| StoreError::InvalidData(format!("bad owner uuid: {}", e)))?;
    Ok(Protection::from_parts(
        ProtectionId(id),
        Coordinate::new(world, x, y, z),
        owner,
        created,
        updated,
        accessed,
        roles,
    ))
}

#[async_trait]
impl ProtectionStore for SqliteBackend {
    async fn insert(&self, protection: &Protection) -> Result<ProtectionId> {
        let protection = protection.clone();
        let conn = self.conn.clone();
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            let tx = conn.transaction()?;
            let c = &protection.coordinate;

            let existing: Option<i64> = tx
                .query_row(
                    &format!(
                        "SELECT id FROM {prefix}protections
                         WHERE world = ?1 AND x = ?2 AND y = ?3 AND z = ?4"
                    ),
                    params![c.world, c.x, c.y, c.z],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                return Err(StoreError::Duplicate(c.clone()));
            }

            tx.execute(
                &format!(
                    "INSERT INTO {prefix}protections
                     (world, x, y, z, owner, created, updated, accessed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    c.world,
                    c.x,
                    c.y,
                    c.z,
                    protection.owner.to_string(),
                    protection.created,
                    protection.updated,
                    protection.accessed,
                ],
            )?;

            let id = tx.last_insert_rowid();
            write_roles(&tx, &prefix, id, protection.roles())?;
            tx.commit()?;

            Ok(ProtectionId(id))
        })
        .await
        .map_err(join_err)?
    }

    async fn update(&self, protection: &Protection) -> Result<()> {
        let protection = protection.clone();
        let conn = self.conn.clone();
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            let tx = conn.transaction()?;

            let changed = tx.execute(
                &format!(
                    "UPDATE {prefix}protections
                     SET owner = ?2, created = ?3, updated = ?4, accessed = ?5
                     WHERE id = ?1"
                ),
                params![
                    protection.id.0,
                    protection.owner.to_string(),
                    protection.created,
                    protection.updated,
                    protection.accessed,
                ],
            )?;

            if changed == 0 {
                return Err(StoreError::NotFound(protection.coordinate.clone()));
            }

            // Rewrite the role list: delete all, then insert current.
            tx.execute(
                &format!("DELETE FROM {prefix}protection_roles WHERE protection_id = ?1"),
                params![protection.id.0],
            )?;
            write_roles(&tx, &prefix, protection.id.0, protection.roles())?;

            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn delete(&self, coordinate: &Coordinate) -> Result<bool> {
        let coordinate = coordinate.clone();
        let conn = self.conn.clone();
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            let tx = conn.transaction()?;

            let id: Option<i64> = tx
                .query_row(
                    &format!(
                        "SELECT id FROM {prefix}protections
                         WHERE world = ?1 AND x = ?2 AND y = ?3 AND z = ?4"
                    ),
                    params![coordinate.world, coordinate.x, coordinate.y, coordinate.z],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(id) = id else {
                return Ok(false);
            };

            tx.execute(
                &format!("DELETE FROM {prefix}protection_roles WHERE protection_id = ?1"),
                params![id],
            )?;
            tx.execute(
                &format!("DELETE FROM {prefix}protections WHERE id = ?1"),
                params![id],
            )?;

            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(join_err)?
    }

    async fn load(&self, coordinate: &Coordinate) -> Result<Option<Protection>> {
        let coordinate = coordinate.clone();
        let conn = self.conn.clone();
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let row: Option<(i64, String, i64, i64, i64)> = conn
                .query_row(
                    &format!(
                        "SELECT id, owner, created, updated, accessed
                         FROM {prefix}protections
                         WHERE world = ?1 AND x = ?2 AND y = ?3 AND z = ?4"
                    ),
                    params![coordinate.world, coordinate.x, coordinate.y, coordinate.z],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, owner, created, updated, accessed)) = row else {
                return Ok(None);
            };

            let roles = load_roles(&conn, &prefix, id)?;
            let protection = protection_from_row(
                id,
                coordinate.world.clone(),
                coordinate.x,
                coordinate.y,
                coordinate.z,
                owner,
                created,
                updated,
                accessed,
                roles,
            )?;

            Ok(Some(protection))
        })
        .await
        .map_err(join_err)?
    }

    async fn load_all(&self) -> Result<Vec<Protection>> {
        let conn = self.conn.clone();
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT id, world, x, y, z, owner, created, updated, accessed
                 FROM {prefix}protections"
            ))?;

            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })?;

            let mut protections = Vec::new();
            for row in rows {
                let (id, world, x, y, z, owner, created, updated, accessed) = row?;
                let roles = load_roles(&conn, &prefix, id)?;
                protections.push(protection_from_row(
                    id, world, x, y, z, owner, created, updated, accessed, roles,
                )?);
            }

            Ok(protections)
        })
        .await
        .map_err(join_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protection(world: &str, x: i64) -> Protection {
        Protection::new(Uuid::new_v4(), Coordinate::new(world, x, 64, 0), 1000)
    }

    #[tokio::test]
    async fn insert_and_load_roundtrip() {
        let backend = SqliteBackend::open_memory().unwrap();
        let mut p = protection("w", 10);
        p.add_role(ProtectionRole::member(Uuid::new_v4()), 1001)
            .unwrap();
        p.add_role(ProtectionRole::group("vip", AccessLevel::Member), 1002)
            .unwrap();
        p.add_role(ProtectionRole::password("sesame"), 1003).unwrap();
        p.add_role(ProtectionRole::public_guest(), 1004).unwrap();
        p.add_role(
            ProtectionRole::new(AccessLevel::Member, RoleSource::Redstone),
            1005,
        )
        .unwrap();

        let id = backend.insert(&p).await.unwrap();
        p.id = id;

        let loaded = backend.load(&p.coordinate).await.unwrap().unwrap();
        assert_eq!(loaded, p);
    }

    #[tokio::test]
    async fn duplicate_coordinate_rejected() {
        let backend = SqliteBackend::open_memory().unwrap();
        let p = protection("w", 10);
        backend.insert(&p).await.unwrap();

        let err = backend.insert(&protection("w", 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn update_rewrites_role_list() {
        let backend = SqliteBackend::open_memory().unwrap();
        let mut p = protection("w", 10);
        p.id = backend.insert(&p).await.unwrap();

        let member = Uuid::new_v4();
        p.add_role(ProtectionRole::member(member), 2000).unwrap();
        backend.update(&p).await.unwrap();

        let loaded = backend.load(&p.coordinate).await.unwrap().unwrap();
        assert_eq!(loaded.roles().len(), 2);
        assert_eq!(loaded.updated, 2000);

        p.remove_role(&RoleSource::Player(member), 3000).unwrap();
        backend.update(&p).await.unwrap();

        let loaded = backend.load(&p.coordinate).await.unwrap().unwrap();
        assert_eq!(loaded.roles().len(), 1);
    }

    #[tokio::test]
    async fn delete_then_load_is_none() {
        let backend = SqliteBackend::open_memory().unwrap();
        let p = protection("w", 10);
        backend.insert(&p).await.unwrap();

        assert!(backend.delete(&p.coordinate).await.unwrap());
        assert!(backend.load(&p.coordinate).await.unwrap().is_none());
        assert!(!backend.delete(&p.coordinate).await.unwrap());
    }

    #[tokio::test]
    async fn load_all_spans_worlds() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend.insert(&protection("w", 1)).await.unwrap();
        backend.insert(&protection("w", 2)).await.unwrap();
        backend.insert(&protection("nether", 1)).await.unwrap();

        let all = backend.load_all().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wardstone.db");

        let p = protection("w", 10);
        {
            let backend = SqliteBackend::open(&path, "ws_").unwrap();
            backend.insert(&p).await.unwrap();
        }

        let backend = SqliteBackend::open(&path, "ws_").unwrap();
        let loaded = backend.load(&p.coordinate).await.unwrap().unwrap();
        assert_eq!(loaded.owner, p.owner);
    }

    #[test]
    fn role_column_codec_covers_builtin_and_custom() {
        let roles = [
            ProtectionRole::member(Uuid::new_v4()),
            ProtectionRole::group("vip", AccessLevel::Guest),
            ProtectionRole::password("pw"),
            ProtectionRole::public_guest(),
            ProtectionRole::new(AccessLevel::Member, RoleSource::Redstone),
            ProtectionRole::new(
                AccessLevel::Guest,
                RoleSource::Custom {
                    kind: "region".into(),
                    target: "spawn".into(),
                },
            ),
        ];

        for role in &roles {
            let (access, kind, target) = role_to_columns(role);
            let decoded = role_from_columns(access, &kind, &target).unwrap();
            assert_eq!(&decoded, role);
        }
    }

    #[test]
    fn bad_access_level_is_invalid_data() {
        assert!(matches!(
            role_from_columns(9, "everyone", ""),
            Err(StoreError::InvalidData(_))
        ));
    }
}

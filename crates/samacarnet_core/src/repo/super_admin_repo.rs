//! Super-admin repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one super-admin row per user (UNIQUE `user_id`).
//! - `permissions_override` is JSON-encoded only at this boundary.

use super::soft_delete::{restore, soft_delete};
use super::{bool_to_int, read_bool, RepoError, RepoResult};
use crate::codec::{decode_permissions_override, encode_permissions_override};
use crate::model::super_admin::{SuperAdmin, SuperAdminId};
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row};

const SUPER_ADMIN_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    access_level,
    permissions_override,
    is_active,
    created_at,
    updated_at,
    deleted_at
FROM super_admins";

pub trait SuperAdminRepository {
    fn create_super_admin(&self, admin: &SuperAdmin) -> RepoResult<SuperAdminId>;
    fn update_super_admin(&self, admin: &SuperAdmin) -> RepoResult<()>;
    fn get_super_admin(
        &self,
        id: SuperAdminId,
        include_deleted: bool,
    ) -> RepoResult<Option<SuperAdmin>>;
    fn find_by_user(&self, user_id: UserId) -> RepoResult<Option<SuperAdmin>>;
    fn list_super_admins(&self, include_deleted: bool) -> RepoResult<Vec<SuperAdmin>>;
    fn soft_delete_super_admin(&self, id: SuperAdminId) -> RepoResult<()>;
    fn restore_super_admin(&self, id: SuperAdminId) -> RepoResult<()>;
}

pub struct SqliteSuperAdminRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSuperAdminRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SuperAdminRepository for SqliteSuperAdminRepository<'_> {
    fn create_super_admin(&self, admin: &SuperAdmin) -> RepoResult<SuperAdminId> {
        admin.validate()?;
        self.conn.execute(
            "INSERT INTO super_admins (
                user_id,
                access_level,
                permissions_override,
                is_active
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                admin.user_id,
                admin.access_level.trim(),
                encode_permissions_override(admin.permissions_override.as_ref())?,
                bool_to_int(admin.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_super_admin(&self, admin: &SuperAdmin) -> RepoResult<()> {
        admin.validate()?;
        let changed = self.conn.execute(
            "UPDATE super_admins
             SET
                access_level = ?1,
                permissions_override = ?2,
                is_active = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4
               AND deleted_at IS NULL;",
            params![
                admin.access_level.trim(),
                encode_permissions_override(admin.permissions_override.as_ref())?,
                bool_to_int(admin.is_active),
                admin.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "super admin",
                id: admin.id,
            });
        }
        Ok(())
    }

    fn get_super_admin(
        &self,
        id: SuperAdminId,
        include_deleted: bool,
    ) -> RepoResult<Option<SuperAdmin>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUPER_ADMIN_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_super_admin_row(row)?));
        }
        Ok(None)
    }

    fn find_by_user(&self, user_id: UserId) -> RepoResult<Option<SuperAdmin>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUPER_ADMIN_SELECT_SQL}
             WHERE user_id = ?1
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_super_admin_row(row)?));
        }
        Ok(None)
    }

    fn list_super_admins(&self, include_deleted: bool) -> RepoResult<Vec<SuperAdmin>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUPER_ADMIN_SELECT_SQL}
             WHERE (?1 = 1 OR deleted_at IS NULL)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([include_deleted])?;
        let mut admins = Vec::new();
        while let Some(row) = rows.next()? {
            admins.push(parse_super_admin_row(row)?);
        }
        Ok(admins)
    }

    fn soft_delete_super_admin(&self, id: SuperAdminId) -> RepoResult<()> {
        soft_delete::<SuperAdmin>(self.conn, id)
    }

    fn restore_super_admin(&self, id: SuperAdminId) -> RepoResult<()> {
        restore::<SuperAdmin>(self.conn, id)
    }
}

fn parse_super_admin_row(row: &Row<'_>) -> RepoResult<SuperAdmin> {
    let overrides: Option<String> = row.get("permissions_override")?;
    Ok(SuperAdmin {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        access_level: row.get("access_level")?,
        permissions_override: decode_permissions_override(overrides.as_deref())?,
        is_active: read_bool(row, "is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

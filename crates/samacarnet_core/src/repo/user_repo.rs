//! Role and user repositories.
//!
//! # Invariants
//! - Emails are stored and looked up in normalized (lowercase) form.
//! - `find_by_email` only matches live users of the given tenant.
//! - Platform users (`tenant_id IS NULL`) are looked up with `None`.

use super::soft_delete::soft_delete;
use super::{bool_to_int, read_bool, read_enum, RepoError, RepoResult};
use crate::model::tenant::TenantId;
use crate::model::user::{normalize_email, Role, RoleId, RoleName, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    role_id,
    email,
    password_hash,
    first_name,
    last_name,
    is_active,
    last_login_at,
    created_at,
    updated_at,
    deleted_at
FROM users";

pub trait RoleRepository {
    /// Inserts the role if missing and returns its id either way.
    fn ensure_role(&self, name: RoleName, description: Option<&str>) -> RepoResult<RoleId>;
    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>>;
    fn find_role(&self, name: RoleName) -> RepoResult<Option<Role>>;
}

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId, include_deleted: bool) -> RepoResult<Option<User>>;
    fn find_by_email(&self, tenant_id: Option<TenantId>, email: &str) -> RepoResult<Option<User>>;
    fn list_users(&self, tenant_id: TenantId) -> RepoResult<Vec<User>>;
    fn record_login(&self, id: UserId, at_ms: i64) -> RepoResult<()>;
    fn soft_delete_user(&self, id: UserId) -> RepoResult<()>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RoleRepository for SqliteUserRepository<'_> {
    fn ensure_role(&self, name: RoleName, description: Option<&str>) -> RepoResult<RoleId> {
        self.conn.execute(
            "INSERT INTO roles (name, description)
             VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING;",
            params![name.as_str(), description],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM roles WHERE name = ?1;",
            [name.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM roles WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_role_row(row)?));
        }
        Ok(None)
    }

    fn find_role(&self, name: RoleName) -> RepoResult<Option<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM roles WHERE name = ?1;")?;
        let mut rows = stmt.query([name.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_role_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (
                tenant_id,
                role_id,
                email,
                password_hash,
                first_name,
                last_name,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                user.tenant_id,
                user.role_id,
                normalize_email(&user.email),
                user.password_hash.as_str(),
                user.first_name.trim(),
                user.last_name.trim(),
                bool_to_int(user.is_active),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId, include_deleted: bool) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_email(&self, tenant_id: Option<TenantId>, email: &str) -> RepoResult<Option<User>> {
        // `IS` matches NULL tenants for platform-level accounts.
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE tenant_id IS ?1
               AND email = ?2
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query(params![tenant_id, normalize_email(email)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self, tenant_id: TenantId) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE tenant_id = ?1
               AND deleted_at IS NULL
             ORDER BY last_name ASC, first_name ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([tenant_id])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn record_login(&self, id: UserId, at_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET last_login_at = ?1
             WHERE id = ?2
               AND deleted_at IS NULL;",
            params![at_ms, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }

    fn soft_delete_user(&self, id: UserId) -> RepoResult<()> {
        soft_delete::<User>(self.conn, id)
    }
}

/// Resolves a role name by id without loading the full role.
pub fn role_name(conn: &Connection, id: RoleId) -> RepoResult<Option<RoleName>> {
    let name: Option<String> = conn
        .query_row("SELECT name FROM roles WHERE id = ?1;", [id], |row| row.get(0))
        .optional()?;
    name.map(|text| {
        RoleName::parse(&text)
            .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{text}` in roles.name")))
    })
    .transpose()
}

fn parse_role_row(row: &Row<'_>) -> RepoResult<Role> {
    Ok(Role {
        id: row.get("id")?,
        name: read_enum(row, "name", RoleName::parse)?,
        description: row.get("description")?,
    })
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        role_id: row.get("role_id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        is_active: read_bool(row, "is_active")?,
        last_login_at: row.get("last_login_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

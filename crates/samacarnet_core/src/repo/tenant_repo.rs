//! Tenant repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `get_tenant(id, false)` hides soft-deleted tenants.
//! - Tenant listing is ordered by `name ASC, id ASC`.

use super::soft_delete::{restore, soft_delete};
use super::{read_enum, RepoError, RepoResult};
use crate::model::tenant::{SubscriptionPlan, Tenant, TenantDatabase, TenantId, TenantStatus};
use rusqlite::{params, Connection, Row};

const TENANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    slug,
    status,
    subscription_plan,
    db_host,
    db_port,
    db_name,
    db_user,
    db_password,
    created_at,
    updated_at,
    deleted_at
FROM tenants";

pub trait TenantRepository {
    fn create_tenant(&self, tenant: &Tenant) -> RepoResult<TenantId>;
    fn update_tenant(&self, tenant: &Tenant) -> RepoResult<()>;
    fn get_tenant(&self, id: TenantId, include_deleted: bool) -> RepoResult<Option<Tenant>>;
    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Tenant>>;
    fn list_tenants(&self, include_deleted: bool) -> RepoResult<Vec<Tenant>>;
    fn soft_delete_tenant(&self, id: TenantId) -> RepoResult<()>;
    fn restore_tenant(&self, id: TenantId) -> RepoResult<()>;
}

pub struct SqliteTenantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTenantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TenantRepository for SqliteTenantRepository<'_> {
    fn create_tenant(&self, tenant: &Tenant) -> RepoResult<TenantId> {
        tenant.validate()?;

        self.conn.execute(
            "INSERT INTO tenants (
                name,
                slug,
                status,
                subscription_plan,
                db_host,
                db_port,
                db_name,
                db_user,
                db_password
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                tenant.name.trim(),
                tenant.slug.as_str(),
                tenant.status.as_str(),
                tenant.subscription_plan.as_str(),
                tenant.database.host.as_deref(),
                tenant.database.port,
                tenant.database.name.as_deref(),
                tenant.database.user.as_deref(),
                tenant.database.password.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_tenant(&self, tenant: &Tenant) -> RepoResult<()> {
        tenant.validate()?;

        let changed = self.conn.execute(
            "UPDATE tenants
             SET
                name = ?1,
                slug = ?2,
                status = ?3,
                subscription_plan = ?4,
                db_host = ?5,
                db_port = ?6,
                db_name = ?7,
                db_user = ?8,
                db_password = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?10
               AND deleted_at IS NULL;",
            params![
                tenant.name.trim(),
                tenant.slug.as_str(),
                tenant.status.as_str(),
                tenant.subscription_plan.as_str(),
                tenant.database.host.as_deref(),
                tenant.database.port,
                tenant.database.name.as_deref(),
                tenant.database.user.as_deref(),
                tenant.database.password.as_deref(),
                tenant.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "tenant",
                id: tenant.id,
            });
        }
        Ok(())
    }

    fn get_tenant(&self, id: TenantId, include_deleted: bool) -> RepoResult<Option<Tenant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TENANT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tenant_row(row)?));
        }
        Ok(None)
    }

    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Tenant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TENANT_SELECT_SQL}
             WHERE slug = ?1
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tenant_row(row)?));
        }
        Ok(None)
    }

    fn list_tenants(&self, include_deleted: bool) -> RepoResult<Vec<Tenant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TENANT_SELECT_SQL}
             WHERE (?1 = 1 OR deleted_at IS NULL)
             ORDER BY name ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([include_deleted])?;
        let mut tenants = Vec::new();
        while let Some(row) = rows.next()? {
            tenants.push(parse_tenant_row(row)?);
        }
        Ok(tenants)
    }

    fn soft_delete_tenant(&self, id: TenantId) -> RepoResult<()> {
        soft_delete::<Tenant>(self.conn, id)
    }

    fn restore_tenant(&self, id: TenantId) -> RepoResult<()> {
        restore::<Tenant>(self.conn, id)
    }
}

fn parse_tenant_row(row: &Row<'_>) -> RepoResult<Tenant> {
    let port = match row.get::<_, Option<i64>>("db_port")? {
        Some(value) => Some(u16::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid port `{value}` in tenants.db_port"))
        })?),
        None => None,
    };

    Ok(Tenant {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        status: read_enum(row, "status", TenantStatus::parse)?,
        subscription_plan: read_enum(row, "subscription_plan", SubscriptionPlan::parse)?,
        database: TenantDatabase {
            host: row.get("db_host")?,
            port,
            name: row.get("db_name")?,
            user: row.get("db_user")?,
            password: row.get("db_password")?,
        },
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

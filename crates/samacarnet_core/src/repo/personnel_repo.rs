//! Personnel repository: staff members bound to users and personnel types.

use super::{bool_to_int, read_bool, RepoError, RepoResult};
use crate::model::personnel::{Personnel, PersonnelId};
use crate::model::tenant::TenantId;
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row};

const PERSONNEL_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    user_id,
    personnel_type_id,
    license_number,
    is_active
FROM personnel";

pub trait PersonnelRepository {
    fn create_personnel(&self, personnel: &Personnel) -> RepoResult<PersonnelId>;
    fn get_personnel(&self, id: PersonnelId) -> RepoResult<Option<Personnel>>;
    fn find_by_user(&self, user_id: UserId) -> RepoResult<Option<Personnel>>;
    fn list_for_tenant(&self, tenant_id: TenantId, include_inactive: bool)
        -> RepoResult<Vec<Personnel>>;
    fn set_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()>;
}

pub struct SqlitePersonnelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonnelRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonnelRepository for SqlitePersonnelRepository<'_> {
    fn create_personnel(&self, personnel: &Personnel) -> RepoResult<PersonnelId> {
        self.conn.execute(
            "INSERT INTO personnel (
                tenant_id,
                user_id,
                personnel_type_id,
                license_number,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                personnel.tenant_id,
                personnel.user_id,
                personnel.personnel_type_id,
                personnel.license_number.as_deref(),
                bool_to_int(personnel.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_personnel(&self, id: PersonnelId) -> RepoResult<Option<Personnel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSONNEL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_personnel_row(row)?));
        }
        Ok(None)
    }

    fn find_by_user(&self, user_id: UserId) -> RepoResult<Option<Personnel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSONNEL_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_personnel_row(row)?));
        }
        Ok(None)
    }

    fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        include_inactive: bool,
    ) -> RepoResult<Vec<Personnel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSONNEL_SELECT_SQL}
             WHERE tenant_id = ?1
               AND (?2 = 1 OR is_active = 1)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query(params![tenant_id, include_inactive])?;
        let mut personnel = Vec::new();
        while let Some(row) = rows.next()? {
            personnel.push(parse_personnel_row(row)?);
        }
        Ok(personnel)
    }

    fn set_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE personnel
             SET is_active = ?1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![bool_to_int(is_active), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "personnel",
                id,
            });
        }
        Ok(())
    }
}

fn parse_personnel_row(row: &Row<'_>) -> RepoResult<Personnel> {
    Ok(Personnel {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        user_id: row.get("user_id")?,
        personnel_type_id: row.get("personnel_type_id")?,
        license_number: row.get("license_number")?,
        is_active: read_bool(row, "is_active")?,
    })
}

//! Soft-delete policy shared by tombstoned entities.
//!
//! # Responsibility
//! - Set `deleted_at` and deactivate the row in one statement.
//! - Reverse both on restore.
//!
//! # Invariants
//! - Rows are never physically removed.
//! - A second soft-delete is a no-op: the first `deleted_at` is kept.
//! - Missing ids are reported as `RepoError::NotFound`.

use super::{RepoError, RepoResult};
use crate::model::medical_history::MedicalHistory;
use crate::model::patient::Patient;
use crate::model::super_admin::SuperAdmin;
use crate::model::tenant::Tenant;
use crate::model::user::User;
use log::debug;
use rusqlite::Connection;

/// Storage description of a soft-deletable entity.
pub trait SoftDeletable {
    /// Entity name used in errors and log events.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Assignment that deactivates the row alongside the tombstone.
    const DEACTIVATE: &'static str;
    /// Assignment that reactivates the row on restore.
    const REACTIVATE: &'static str;
}

impl SoftDeletable for Patient {
    const ENTITY: &'static str = "patient";
    const TABLE: &'static str = "patients";
    const DEACTIVATE: &'static str = "is_active = 0";
    const REACTIVATE: &'static str = "is_active = 1";
}

impl SoftDeletable for MedicalHistory {
    const ENTITY: &'static str = "medical history";
    const TABLE: &'static str = "medical_histories";
    const DEACTIVATE: &'static str = "is_active = 0";
    const REACTIVATE: &'static str = "is_active = 1";
}

impl SoftDeletable for SuperAdmin {
    const ENTITY: &'static str = "super admin";
    const TABLE: &'static str = "super_admins";
    const DEACTIVATE: &'static str = "is_active = 0";
    const REACTIVATE: &'static str = "is_active = 1";
}

impl SoftDeletable for User {
    const ENTITY: &'static str = "user";
    const TABLE: &'static str = "users";
    const DEACTIVATE: &'static str = "is_active = 0";
    const REACTIVATE: &'static str = "is_active = 1";
}

/// Restored tenants stay `inactive` until their status is set explicitly.
impl SoftDeletable for Tenant {
    const ENTITY: &'static str = "tenant";
    const TABLE: &'static str = "tenants";
    const DEACTIVATE: &'static str = "status = 'inactive'";
    const REACTIVATE: &'static str = "status = 'inactive'";
}

/// Tombstones one row. Re-deleting an already deleted row changes nothing.
pub fn soft_delete<E: SoftDeletable>(conn: &Connection, id: i64) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE {table}
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                {deactivate},
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            table = E::TABLE,
            deactivate = E::DEACTIVATE,
        ),
        [id],
    )?;

    if changed == 0 {
        ensure_exists::<E>(conn, id)?;
    }
    debug!(
        "event=soft_delete module=repo status=ok entity={} id={} noop={}",
        E::TABLE,
        id,
        changed == 0
    );
    Ok(())
}

/// Clears the tombstone and reactivates the row. No-op on live rows.
pub fn restore<E: SoftDeletable>(conn: &Connection, id: i64) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE {table}
             SET
                deleted_at = NULL,
                {reactivate},
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NOT NULL;",
            table = E::TABLE,
            reactivate = E::REACTIVATE,
        ),
        [id],
    )?;

    if changed == 0 {
        ensure_exists::<E>(conn, id)?;
    }
    debug!(
        "event=restore module=repo status=ok entity={} id={} noop={}",
        E::TABLE,
        id,
        changed == 0
    );
    Ok(())
}

/// Returns the tombstone of a row, `None` while it is live.
pub fn deleted_at<E: SoftDeletable>(conn: &Connection, id: i64) -> RepoResult<Option<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT deleted_at FROM {} WHERE id = ?1;",
        E::TABLE
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Err(RepoError::NotFound {
            entity: E::ENTITY,
            id,
        }),
    }
}

fn ensure_exists<E: SoftDeletable>(conn: &Connection, id: i64) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);", E::TABLE),
        [id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(RepoError::NotFound {
            entity: E::ENTITY,
            id,
        });
    }
    Ok(())
}

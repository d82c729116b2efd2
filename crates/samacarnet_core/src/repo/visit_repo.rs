//! Visit repository contracts and SQLite implementation.
//!
//! Visit mutations that change lifecycle state go through
//! `service::visit_service`, which pairs them with an audit-trail append.

use super::{read_enum, RepoError, RepoResult};
use crate::model::patient::PatientId;
use crate::model::visit::{Visit, VisitId, VisitStatus};
use rusqlite::{params, Connection, Row};

const VISIT_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    patient_id,
    personnel_id,
    scheduled_at,
    status,
    reason,
    notes,
    created_at,
    updated_at
FROM visits";

pub trait VisitRepository {
    fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId>;
    fn update_visit(&self, visit: &Visit) -> RepoResult<()>;
    fn get_visit(&self, id: VisitId) -> RepoResult<Option<Visit>>;
    /// Visits of one patient, most recent schedule first.
    fn list_for_patient(
        &self,
        patient_id: PatientId,
        status: Option<VisitStatus>,
    ) -> RepoResult<Vec<Visit>>;
}

pub struct SqliteVisitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVisitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VisitRepository for SqliteVisitRepository<'_> {
    fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId> {
        visit.validate()?;
        self.conn.execute(
            "INSERT INTO visits (
                tenant_id,
                patient_id,
                personnel_id,
                scheduled_at,
                status,
                reason,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                visit.tenant_id,
                visit.patient_id,
                visit.personnel_id,
                visit.scheduled_at,
                visit.status.as_str(),
                visit.reason.as_deref(),
                visit.notes.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_visit(&self, visit: &Visit) -> RepoResult<()> {
        visit.validate()?;
        let changed = self.conn.execute(
            "UPDATE visits
             SET
                personnel_id = ?1,
                scheduled_at = ?2,
                status = ?3,
                reason = ?4,
                notes = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                visit.personnel_id,
                visit.scheduled_at,
                visit.status.as_str(),
                visit.reason.as_deref(),
                visit.notes.as_deref(),
                visit.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "visit",
                id: visit.id,
            });
        }
        Ok(())
    }

    fn get_visit(&self, id: VisitId) -> RepoResult<Option<Visit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VISIT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_visit_row(row)?));
        }
        Ok(None)
    }

    fn list_for_patient(
        &self,
        patient_id: PatientId,
        status: Option<VisitStatus>,
    ) -> RepoResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VISIT_SELECT_SQL}
             WHERE patient_id = ?1
               AND (?2 IS NULL OR status = ?2)
             ORDER BY scheduled_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query(params![patient_id, status.map(VisitStatus::as_str)])?;
        let mut visits = Vec::new();
        while let Some(row) = rows.next()? {
            visits.push(parse_visit_row(row)?);
        }
        Ok(visits)
    }
}

fn parse_visit_row(row: &Row<'_>) -> RepoResult<Visit> {
    Ok(Visit {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        patient_id: row.get("patient_id")?,
        personnel_id: row.get("personnel_id")?,
        scheduled_at: row.get("scheduled_at")?,
        status: read_enum(row, "status", VisitStatus::parse)?,
        reason: row.get("reason")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

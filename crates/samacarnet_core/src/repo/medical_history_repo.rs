//! Medical history repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Entries of one patient list by `date_recorded DESC, id DESC`.
//! - Tombstoned entries are excluded unless explicitly requested.
//! - Storage rejects `deleted_at` without `is_active = 0` (CHECK constraint).

use super::soft_delete::{restore, soft_delete};
use super::{bool_to_int, read_bool, read_enum, read_optional_enum, RepoError, RepoResult};
use crate::model::medical_history::{
    MedicalHistory, MedicalHistoryId, MedicalHistoryType, Severity,
};
use crate::model::patient::PatientId;
use rusqlite::{params, Connection, Row};

const MEDICAL_HISTORY_SELECT_SQL: &str = "SELECT
    id,
    patient_id,
    type,
    title,
    description,
    date_recorded,
    severity,
    is_active,
    created_at,
    updated_at,
    deleted_at
FROM medical_histories";

pub trait MedicalHistoryRepository {
    fn create_entry(&self, entry: &MedicalHistory) -> RepoResult<MedicalHistoryId>;
    fn update_entry(&self, entry: &MedicalHistory) -> RepoResult<()>;
    fn get_entry(
        &self,
        id: MedicalHistoryId,
        include_deleted: bool,
    ) -> RepoResult<Option<MedicalHistory>>;
    fn list_for_patient(
        &self,
        patient_id: PatientId,
        kind: Option<MedicalHistoryType>,
        include_deleted: bool,
    ) -> RepoResult<Vec<MedicalHistory>>;
    fn soft_delete_entry(&self, id: MedicalHistoryId) -> RepoResult<()>;
    fn restore_entry(&self, id: MedicalHistoryId) -> RepoResult<()>;
}

pub struct SqliteMedicalHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMedicalHistoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MedicalHistoryRepository for SqliteMedicalHistoryRepository<'_> {
    fn create_entry(&self, entry: &MedicalHistory) -> RepoResult<MedicalHistoryId> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO medical_histories (
                patient_id,
                type,
                title,
                description,
                date_recorded,
                severity,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                entry.patient_id,
                entry.kind.as_str(),
                entry.title.trim(),
                entry.description.as_deref(),
                entry.date_recorded.as_str(),
                entry.severity.map(Severity::as_str),
                bool_to_int(entry.is_active),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_entry(&self, entry: &MedicalHistory) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE medical_histories
             SET
                type = ?1,
                title = ?2,
                description = ?3,
                date_recorded = ?4,
                severity = ?5,
                is_active = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7
               AND deleted_at IS NULL;",
            params![
                entry.kind.as_str(),
                entry.title.trim(),
                entry.description.as_deref(),
                entry.date_recorded.as_str(),
                entry.severity.map(Severity::as_str),
                bool_to_int(entry.is_active),
                entry.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "medical history",
                id: entry.id,
            });
        }
        Ok(())
    }

    fn get_entry(
        &self,
        id: MedicalHistoryId,
        include_deleted: bool,
    ) -> RepoResult<Option<MedicalHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEDICAL_HISTORY_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_medical_history_row(row)?));
        }
        Ok(None)
    }

    fn list_for_patient(
        &self,
        patient_id: PatientId,
        kind: Option<MedicalHistoryType>,
        include_deleted: bool,
    ) -> RepoResult<Vec<MedicalHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEDICAL_HISTORY_SELECT_SQL}
             WHERE patient_id = ?1
               AND (?2 IS NULL OR type = ?2)
               AND (?3 = 1 OR deleted_at IS NULL)
             ORDER BY date_recorded DESC, id DESC;"
        ))?;
        let mut rows = stmt.query(params![
            patient_id,
            kind.map(MedicalHistoryType::as_str),
            include_deleted
        ])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_medical_history_row(row)?);
        }
        Ok(entries)
    }

    fn soft_delete_entry(&self, id: MedicalHistoryId) -> RepoResult<()> {
        soft_delete::<MedicalHistory>(self.conn, id)
    }

    fn restore_entry(&self, id: MedicalHistoryId) -> RepoResult<()> {
        restore::<MedicalHistory>(self.conn, id)
    }
}

fn parse_medical_history_row(row: &Row<'_>) -> RepoResult<MedicalHistory> {
    let entry = MedicalHistory {
        id: row.get("id")?,
        patient_id: row.get("patient_id")?,
        kind: read_enum(row, "type", MedicalHistoryType::parse)?,
        title: row.get("title")?,
        description: row.get("description")?,
        date_recorded: row.get("date_recorded")?,
        severity: read_optional_enum(row, "severity", Severity::parse)?,
        is_active: read_bool(row, "is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    entry.validate().map_err(|err| {
        RepoError::InvalidData(format!("medical_histories row {}: {err}", entry.id))
    })?;
    Ok(entry)
}

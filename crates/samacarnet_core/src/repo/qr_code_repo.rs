//! QR code repository contracts and SQLite implementation.

use super::{bool_to_int, read_bool, RepoError, RepoResult};
use crate::model::patient::PatientId;
use crate::model::qr_code::{QrCode, QrCodeId};
use rusqlite::{params, Connection, Row};

const QR_CODE_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    patient_id,
    code,
    payload,
    expires_at,
    is_active,
    created_at,
    updated_at
FROM qr_codes";

pub trait QrCodeRepository {
    fn create_qr_code(&self, qr_code: &QrCode) -> RepoResult<QrCodeId>;
    fn find_by_code(&self, code: &str) -> RepoResult<Option<QrCode>>;
    fn list_for_patient(&self, patient_id: PatientId) -> RepoResult<Vec<QrCode>>;
    fn deactivate(&self, id: QrCodeId) -> RepoResult<()>;
    /// Deactivates every active code of a patient; returns how many changed.
    fn deactivate_for_patient(&self, patient_id: PatientId) -> RepoResult<usize>;
}

pub struct SqliteQrCodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQrCodeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl QrCodeRepository for SqliteQrCodeRepository<'_> {
    fn create_qr_code(&self, qr_code: &QrCode) -> RepoResult<QrCodeId> {
        qr_code.validate()?;
        self.conn.execute(
            "INSERT INTO qr_codes (
                tenant_id,
                patient_id,
                code,
                payload,
                expires_at,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                qr_code.tenant_id,
                qr_code.patient_id,
                qr_code.code.as_str(),
                qr_code.payload.as_str(),
                qr_code.expires_at,
                bool_to_int(qr_code.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_by_code(&self, code: &str) -> RepoResult<Option<QrCode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QR_CODE_SELECT_SQL} WHERE code = ?1;"))?;
        let mut rows = stmt.query([code])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_qr_code_row(row)?));
        }
        Ok(None)
    }

    fn list_for_patient(&self, patient_id: PatientId) -> RepoResult<Vec<QrCode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QR_CODE_SELECT_SQL}
             WHERE patient_id = ?1
             ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([patient_id])?;
        let mut codes = Vec::new();
        while let Some(row) = rows.next()? {
            codes.push(parse_qr_code_row(row)?);
        }
        Ok(codes)
    }

    fn deactivate(&self, id: QrCodeId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE qr_codes
             SET is_active = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "qr code",
                id,
            });
        }
        Ok(())
    }

    fn deactivate_for_patient(&self, patient_id: PatientId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE qr_codes
             SET is_active = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE patient_id = ?1
               AND is_active = 1;",
            [patient_id],
        )?;
        Ok(changed)
    }
}

fn parse_qr_code_row(row: &Row<'_>) -> RepoResult<QrCode> {
    Ok(QrCode {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        patient_id: row.get("patient_id")?,
        code: row.get("code")?,
        payload: row.get("payload")?,
        expires_at: row.get("expires_at")?,
        is_active: read_bool(row, "is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

//! Patient QR code issuance and resolution.
//!
//! # Invariants
//! - Codes are random v4 UUIDs in simple (32 hex chars) form.
//! - `resolve` only returns live patients behind active, unexpired codes.

use super::patient_service::{PatientServiceError, PatientServiceResult};
use crate::model::patient::{Patient, PatientId};
use crate::model::qr_code::{build_payload, QrCode, QrCodeId};
use crate::repo::patient_repo::{PatientRepository, SqlitePatientRepository};
use crate::repo::qr_code_repo::{QrCodeRepository, SqliteQrCodeRepository};
use log::info;
use rusqlite::Connection;
use std::time::Duration;
use uuid::Uuid;

pub struct QrCodeService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> QrCodeService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Issues a new code for a live patient. `ttl = None` never expires.
    pub fn issue(
        &self,
        patient_id: PatientId,
        ttl: Option<Duration>,
    ) -> PatientServiceResult<QrCode> {
        let patient = SqlitePatientRepository::new(self.conn)
            .get_patient(patient_id, false)?
            .ok_or(PatientServiceError::PatientNotFound(patient_id))?;

        let code = Uuid::new_v4().simple().to_string();
        let expires_at = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            crate::now_epoch_ms().saturating_add(ttl_ms)
        });
        let qr_code = QrCode {
            id: 0,
            tenant_id: patient.tenant_id,
            patient_id,
            payload: build_payload(&patient.patient_number, &code),
            code,
            expires_at,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };

        let repo = SqliteQrCodeRepository::new(self.conn);
        let id = repo.create_qr_code(&qr_code)?;
        info!("event=qr_issue module=qr_code status=ok patient_id={patient_id} qr_id={id}");
        repo.find_by_code(&qr_code.code)?
            .ok_or(PatientServiceError::Repo(crate::repo::RepoError::NotFound {
                entity: "qr code",
                id,
            }))
    }

    /// Looks up the patient behind a scanned code.
    ///
    /// Returns `None` for unknown, revoked or expired codes and for
    /// archived patients.
    pub fn resolve(&self, code: &str) -> PatientServiceResult<Option<Patient>> {
        let Some(qr_code) = SqliteQrCodeRepository::new(self.conn).find_by_code(code.trim())? else {
            return Ok(None);
        };
        if !qr_code.is_usable_at(crate::now_epoch_ms()) {
            return Ok(None);
        }
        Ok(SqlitePatientRepository::new(self.conn).get_patient(qr_code.patient_id, false)?)
    }

    pub fn revoke(&self, id: QrCodeId) -> PatientServiceResult<()> {
        SqliteQrCodeRepository::new(self.conn).deactivate(id)?;
        Ok(())
    }

    pub fn list_for_patient(&self, patient_id: PatientId) -> PatientServiceResult<Vec<QrCode>> {
        Ok(SqliteQrCodeRepository::new(self.conn).list_for_patient(patient_id)?)
    }
}

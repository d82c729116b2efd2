//! Patient registration, archival and medical-history use cases.
//!
//! # Responsibility
//! - Assign tenant-scoped patient numbers at registration.
//! - Archive patients together with their QR codes.
//! - Attach and detach medical-history entries.
//!
//! # Invariants
//! - Number assignment and insert share one immediate transaction.
//! - Archiving never hard-deletes; history rows remain readable.

use crate::model::medical_history::{MedicalHistory, MedicalHistoryId, MedicalHistoryType};
use crate::model::patient::{Patient, PatientId};
use crate::repo::medical_history_repo::{MedicalHistoryRepository, SqliteMedicalHistoryRepository};
use crate::repo::patient_repo::{PatientListQuery, PatientRepository, SqlitePatientRepository};
use crate::repo::qr_code_repo::{QrCodeRepository, SqliteQrCodeRepository};
use crate::repo::RepoError;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum PatientServiceError {
    PatientNotFound(PatientId),
    MedicalHistoryNotFound(MedicalHistoryId),
    Repo(RepoError),
}

impl Display for PatientServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PatientNotFound(id) => write!(f, "patient not found: {id}"),
            Self::MedicalHistoryNotFound(id) => write!(f, "medical history not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PatientServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PatientServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "patient",
                id,
            } => Self::PatientNotFound(id),
            RepoError::NotFound {
                entity: "medical history",
                id,
            } => Self::MedicalHistoryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for PatientServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type PatientServiceResult<T> = Result<T, PatientServiceError>;

pub struct PatientService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PatientService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts a patient, assigning the next `SC-` number when blank.
    pub fn register_patient(&self, patient: &Patient) -> PatientServiceResult<Patient> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqlitePatientRepository::new(&tx);
        let mut draft = patient.clone();
        if draft.patient_number.trim().is_empty() {
            draft.patient_number = repo.next_patient_number(draft.tenant_id)?;
        }
        let id = repo.create_patient(&draft)?;
        let created = repo
            .get_patient(id, false)?
            .ok_or(PatientServiceError::PatientNotFound(id))?;
        tx.commit()?;

        info!(
            "event=patient_register module=patient status=ok tenant_id={} patient_id={id}",
            created.tenant_id
        );
        Ok(created)
    }

    pub fn get_patient(
        &self,
        id: PatientId,
        include_deleted: bool,
    ) -> PatientServiceResult<Patient> {
        SqlitePatientRepository::new(self.conn)
            .get_patient(id, include_deleted)?
            .ok_or(PatientServiceError::PatientNotFound(id))
    }

    pub fn list_patients(&self, query: &PatientListQuery) -> PatientServiceResult<Vec<Patient>> {
        Ok(SqlitePatientRepository::new(self.conn).list_patients(query)?)
    }

    /// Soft-deletes a patient and deactivates every QR code it holds.
    /// Returns how many QR codes were deactivated.
    pub fn archive_patient(&self, id: PatientId) -> PatientServiceResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        SqlitePatientRepository::new(&tx).soft_delete_patient(id)?;
        let revoked = SqliteQrCodeRepository::new(&tx).deactivate_for_patient(id)?;
        tx.commit()?;

        info!(
            "event=patient_archive module=patient status=ok patient_id={id} qr_revoked={revoked}"
        );
        Ok(revoked)
    }

    /// Lifts a patient tombstone. QR codes stay revoked.
    pub fn restore_patient(&self, id: PatientId) -> PatientServiceResult<()> {
        SqlitePatientRepository::new(self.conn).restore_patient(id)?;
        Ok(())
    }

    /// Attaches a medical-history entry to a live patient.
    pub fn add_medical_history(
        &self,
        entry: &MedicalHistory,
    ) -> PatientServiceResult<MedicalHistory> {
        self.get_patient(entry.patient_id, false)?;
        let repo = SqliteMedicalHistoryRepository::new(self.conn);
        let id = repo.create_entry(entry)?;
        repo.get_entry(id, false)?
            .ok_or(PatientServiceError::MedicalHistoryNotFound(id))
    }

    pub fn remove_medical_history(&self, id: MedicalHistoryId) -> PatientServiceResult<()> {
        SqliteMedicalHistoryRepository::new(self.conn).soft_delete_entry(id)?;
        Ok(())
    }

    /// Live entries of one patient, newest first.
    pub fn medical_history(
        &self,
        patient_id: PatientId,
        kind: Option<MedicalHistoryType>,
    ) -> PatientServiceResult<Vec<MedicalHistory>> {
        self.get_patient(patient_id, true)?;
        Ok(SqliteMedicalHistoryRepository::new(self.conn).list_for_patient(
            patient_id,
            kind,
            false,
        )?)
    }
}

//! Patient repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `patients`, encoding structured medical fields as JSON.
//! - Tenant-scoped listing with soft-delete filtering and pagination.
//!
//! # Invariants
//! - Listing is ordered by `last_name ASC, first_name ASC, id ASC`.
//! - `(patient_number, national_id)` uniqueness is enforced by storage.

use super::soft_delete::{restore, soft_delete};
use super::{
    bool_to_int, push_pagination, read_bool, read_enum, read_optional_enum, RepoError, RepoResult,
};
use crate::codec::{
    decode_allergies, decode_emergency_contact, decode_medications, encode_allergies,
    encode_emergency_contact, encode_medications,
};
use crate::model::patient::{
    format_patient_number, patient_number_prefix, BloodType, Gender, Patient, PatientId,
};
use crate::model::tenant::TenantId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PATIENT_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    user_id,
    patient_number,
    national_id,
    first_name,
    last_name,
    date_of_birth,
    gender,
    phone,
    email,
    address,
    blood_type,
    allergies,
    medications,
    emergency_contact,
    is_active,
    created_at,
    updated_at,
    deleted_at
FROM patients";

/// Query options for listing patients of one tenant.
#[derive(Debug, Clone, Default)]
pub struct PatientListQuery {
    pub tenant_id: TenantId,
    /// Case-insensitive match on name or patient number.
    pub search: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait PatientRepository {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId>;
    fn update_patient(&self, patient: &Patient) -> RepoResult<()>;
    fn get_patient(&self, id: PatientId, include_deleted: bool) -> RepoResult<Option<Patient>>;
    fn find_by_number(&self, tenant_id: TenantId, patient_number: &str)
        -> RepoResult<Option<Patient>>;
    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<Patient>>;
    fn soft_delete_patient(&self, id: PatientId) -> RepoResult<()>;
    fn restore_patient(&self, id: PatientId) -> RepoResult<()>;
    /// Next tenant-local patient number, one past the highest numeric
    /// `SC-<tenant>-` sequence on record, tombstoned rows included.
    fn next_patient_number(&self, tenant_id: TenantId) -> RepoResult<String>;
}

pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId> {
        patient.validate()?;

        self.conn.execute(
            "INSERT INTO patients (
                tenant_id,
                user_id,
                patient_number,
                national_id,
                first_name,
                last_name,
                date_of_birth,
                gender,
                phone,
                email,
                address,
                blood_type,
                allergies,
                medications,
                emergency_contact,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16);",
            params![
                patient.tenant_id,
                patient.user_id,
                patient.patient_number.trim(),
                patient.national_id.trim(),
                patient.first_name.trim(),
                patient.last_name.trim(),
                patient.date_of_birth.as_str(),
                patient.gender.as_str(),
                patient.phone.as_deref(),
                patient.email.as_deref(),
                patient.address.as_deref(),
                patient.blood_type.map(BloodType::as_str),
                encode_allergies(&patient.allergies)?,
                encode_medications(&patient.medications)?,
                encode_emergency_contact(patient.emergency_contact.as_ref())?,
                bool_to_int(patient.is_active),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_patient(&self, patient: &Patient) -> RepoResult<()> {
        patient.validate()?;

        let changed = self.conn.execute(
            "UPDATE patients
             SET
                user_id = ?1,
                patient_number = ?2,
                national_id = ?3,
                first_name = ?4,
                last_name = ?5,
                date_of_birth = ?6,
                gender = ?7,
                phone = ?8,
                email = ?9,
                address = ?10,
                blood_type = ?11,
                allergies = ?12,
                medications = ?13,
                emergency_contact = ?14,
                is_active = ?15,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?16
               AND deleted_at IS NULL;",
            params![
                patient.user_id,
                patient.patient_number.trim(),
                patient.national_id.trim(),
                patient.first_name.trim(),
                patient.last_name.trim(),
                patient.date_of_birth.as_str(),
                patient.gender.as_str(),
                patient.phone.as_deref(),
                patient.email.as_deref(),
                patient.address.as_deref(),
                patient.blood_type.map(BloodType::as_str),
                encode_allergies(&patient.allergies)?,
                encode_medications(&patient.medications)?,
                encode_emergency_contact(patient.emergency_contact.as_ref())?,
                bool_to_int(patient.is_active),
                patient.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "patient",
                id: patient.id,
            });
        }
        Ok(())
    }

    fn get_patient(&self, id: PatientId, include_deleted: bool) -> RepoResult<Option<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PATIENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_patient_row(row)?));
        }
        Ok(None)
    }

    fn find_by_number(
        &self,
        tenant_id: TenantId,
        patient_number: &str,
    ) -> RepoResult<Option<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PATIENT_SELECT_SQL}
             WHERE tenant_id = ?1
               AND patient_number = ?2
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query(params![tenant_id, patient_number.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_patient_row(row)?));
        }
        Ok(None)
    }

    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<Patient>> {
        let mut sql = format!("{PATIENT_SELECT_SQL} WHERE tenant_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(query.tenant_id)];

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                sql.push_str(
                    " AND (first_name LIKE ? OR last_name LIKE ? OR patient_number LIKE ?)",
                );
                let pattern = format!("%{search}%");
                for _ in 0..3 {
                    bind_values.push(Value::Text(pattern.clone()));
                }
            }
        }

        sql.push_str(" ORDER BY last_name ASC, first_name ASC, id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }

    fn soft_delete_patient(&self, id: PatientId) -> RepoResult<()> {
        soft_delete::<Patient>(self.conn, id)
    }

    fn restore_patient(&self, id: PatientId) -> RepoResult<()> {
        restore::<Patient>(self.conn, id)
    }

    fn next_patient_number(&self, tenant_id: TenantId) -> RepoResult<String> {
        let prefix = patient_number_prefix(tenant_id);
        // Manually entered numbers share the prefix, so the sequence comes
        // from the highest suffix rather than the row count.
        let highest: Option<i64> = self.conn.query_row(
            "SELECT MAX(CAST(substr(patient_number, ?2) AS INTEGER))
             FROM patients
             WHERE substr(patient_number, 1, ?3) = ?1
               AND length(patient_number) >= ?2
               AND substr(patient_number, ?2) NOT GLOB '*[^0-9]*';",
            params![prefix, prefix.len() as i64 + 1, prefix.len() as i64],
            |row| row.get(0),
        )?;
        Ok(format_patient_number(
            tenant_id,
            highest.unwrap_or(0).saturating_add(1),
        ))
    }
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    let allergies: String = row.get("allergies")?;
    let medications: String = row.get("medications")?;
    let emergency_contact: Option<String> = row.get("emergency_contact")?;

    let patient = Patient {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        user_id: row.get("user_id")?,
        patient_number: row.get("patient_number")?,
        national_id: row.get("national_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        date_of_birth: row.get("date_of_birth")?,
        gender: read_enum(row, "gender", Gender::parse)?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
        blood_type: read_optional_enum(row, "blood_type", BloodType::parse)?,
        allergies: decode_allergies(&allergies)?,
        medications: decode_medications(&medications)?,
        emergency_contact: decode_emergency_contact(emergency_contact.as_deref())?,
        is_active: read_bool(row, "is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    patient.validate().map_err(|err| {
        RepoError::InvalidData(format!("patients row {}: {err}", patient.id))
    })?;
    Ok(patient)
}

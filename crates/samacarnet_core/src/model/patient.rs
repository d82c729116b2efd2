//! Patient domain model.
//!
//! # Invariants
//! - `(patient_number, national_id)` is unique.
//! - `allergies`, `medications` and `emergency_contact` are structured values
//!   encoded to JSON only at the persistence boundary.
//! - A soft-deleted patient is never active.

use super::tenant::TenantId;
use super::user::UserId;
use super::{db_enum, require_email, require_iso_date, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type PatientId = i64;

db_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

db_enum! {
    /// ABO/Rh blood group.
    pub enum BloodType {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
}

/// Current medication entry stored on the patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub patient_number: String,
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_type: Option<BloodType>,
    pub allergies: Vec<String>,
    pub medications: Vec<Medication>,
    pub emergency_contact: Option<EmergencyContact>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Patient {
    /// Creates an active patient with empty medical fields.
    pub fn new(
        tenant_id: TenantId,
        patient_number: impl Into<String>,
        national_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            id: 0,
            tenant_id,
            user_id: None,
            patient_number: patient_number.into(),
            national_id: national_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: date_of_birth.into(),
            gender,
            phone: None,
            email: None,
            address: None,
            blood_type: None,
            allergies: Vec::new(),
            medications: Vec::new(),
            emergency_contact: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("patient_number", &self.patient_number)?;
        require_text("national_id", &self.national_id)?;
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_iso_date("date_of_birth", &self.date_of_birth)?;
        if let Some(email) = self.email.as_deref() {
            require_email("email", email)?;
        }
        if self.allergies.iter().any(|allergy| allergy.trim().is_empty()) {
            return Err(ValidationError::BlankField("allergies"));
        }
        if self.medications.iter().any(|med| med.name.trim().is_empty()) {
            return Err(ValidationError::BlankField("medications.name"));
        }
        if self.deleted_at.is_some() && self.is_active {
            return Err(ValidationError::DeletedButActive);
        }
        Ok(())
    }
}

/// Prefix shared by every generated number of one tenant, e.g. `SC-0003-`.
pub fn patient_number_prefix(tenant_id: TenantId) -> String {
    format!("SC-{tenant_id:04}-")
}

/// Formats a tenant-local patient number, e.g. `SC-0003-000042`.
pub fn format_patient_number(tenant_id: TenantId, sequence: i64) -> String {
    format!("{}{sequence:06}", patient_number_prefix(tenant_id))
}

#[cfg(test)]
mod tests {
    use super::{format_patient_number, BloodType, Gender, Medication, Patient};
    use crate::model::ValidationError;

    fn sample() -> Patient {
        Patient::new(
            1,
            "SC-0001-000001",
            "1234567890123",
            "Awa",
            "Diop",
            "1988-02-11",
            Gender::Female,
        )
    }

    #[test]
    fn patient_numbers_are_zero_padded() {
        assert_eq!(format_patient_number(3, 42), "SC-0003-000042");
    }

    #[test]
    fn blood_type_uses_clinical_notation() {
        assert_eq!(BloodType::AbNegative.as_str(), "AB-");
        assert_eq!(BloodType::parse("O+"), Some(BloodType::OPositive));
        assert_eq!(BloodType::parse("C+"), None);
    }

    #[test]
    fn medications_need_a_name() {
        let mut patient = sample();
        assert!(patient.validate().is_ok());
        patient.medications.push(Medication {
            name: " ".to_string(),
            dosage: None,
            frequency: None,
        });
        assert_eq!(
            patient.validate(),
            Err(ValidationError::BlankField("medications.name"))
        );
    }
}
